use super::executor::Cell;

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub first_name: String,
    pub second_name: Option<String>,
}

impl User {
    pub fn display_name(&self) -> String {
        match &self.second_name {
            Some(second) => format!("{} {}", self.first_name, second),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artist {
    pub artist_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
}

impl Artist {
    pub fn display_name(&self) -> String {
        let first = self.first_name.as_deref().unwrap_or("");
        let last = self.last_name.as_deref().unwrap_or("");
        format!("{} {}", first, last).trim().to_string()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Song {
    pub song_id: String,
    pub name: String,
    pub genre: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub playlist_id: String,
    pub playlist_name: String,
    pub created_date: String,
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Plan {
    pub plan_id: String,
    pub plan_name: String,
    pub price: Option<f64>,
}

pub(crate) fn text_at(cells: &[Cell], index: usize) -> String {
    cells
        .get(index)
        .map(|cell| cell.to_string())
        .unwrap_or_default()
}

pub(crate) fn opt_text_at(cells: &[Cell], index: usize) -> Option<String> {
    match cells.get(index) {
        Some(Cell::Null) | None => None,
        Some(cell) => Some(cell.to_string()),
    }
}
