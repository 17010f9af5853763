//! Navigation shell: which view is currently shown.

use serde::Serialize;

use crate::domain::View;

#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Shell {
    active_view: View,
}

impl Shell {
    pub fn active_view(&self) -> View {
        self.active_view
    }

    pub fn navigate(&mut self, view: View) {
        self.active_view = view;
    }
}
