use std::{convert::Infallible, str::FromStr};

use serde::{Deserialize, Serialize};

use crate::data::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub enum ClickKind {
    #[serde(rename = "normal", alias = "click")]
    Normal,
    #[serde(rename = "flag")]
    Flag,
}

impl FromStr for ClickKind {
    type Err = Infallible;

    /// Anything other than `"flag"` is a normal click.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim() {
            "flag" => Self::Flag,
            _ => Self::Normal,
        })
    }
}

/// A player's click as it arrives from the request layer.
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClickRequest {
    pub row: usize,
    pub col: usize,
    #[serde(default = "default_click_type")]
    pub click_type: ClickKind,
}

fn default_click_type() -> ClickKind {
    ClickKind::Normal
}

impl ClickRequest {
    pub fn position(&self) -> Position {
        Position::new(self.row, self.col)
    }
}
