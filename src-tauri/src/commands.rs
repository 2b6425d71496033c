// Tauri IPC Commands
use serde::Serialize;
use tauri::State;

use crate::state::{DbConnection, DeleteScope};
use crate::views::{
    self, AddComponentForm, AddMachineForm, DeleteHistoryForm, MoveForm, Notice, Page, PageEntry,
    PageView,
};

#[derive(Debug, Serialize)]
pub struct CommandError {
    message: String,
}

impl<E: std::fmt::Display> From<E> for CommandError {
    fn from(error: E) -> Self {
        CommandError {
            message: error.to_string(),
        }
    }
}

type CommandResult<T> = Result<T, CommandError>;

// ==================== PAGE COMMANDS ====================

#[tauri::command]
pub fn list_pages() -> Vec<PageEntry> {
    views::page_entries()
}

#[tauri::command]
pub fn render_page(db: State<'_, DbConnection>, page: Page) -> CommandResult<PageView> {
    Ok(views::render(&db, page)?)
}

// ==================== FORM COMMANDS ====================

#[tauri::command]
pub fn move_component(db: State<'_, DbConnection>, input: MoveForm) -> CommandResult<Notice> {
    Ok(input.submit(&db)?)
}

#[tauri::command]
pub fn add_machine(db: State<'_, DbConnection>, input: AddMachineForm) -> CommandResult<Notice> {
    Ok(input.submit(&db)?)
}

#[tauri::command]
pub fn add_component(
    db: State<'_, DbConnection>,
    input: AddComponentForm,
) -> CommandResult<Notice> {
    Ok(input.submit(&db)?)
}

#[tauri::command]
pub fn delete_history(
    db: State<'_, DbConnection>,
    input: DeleteHistoryForm,
) -> CommandResult<Notice> {
    Ok(input.submit(&db)?)
}

#[tauri::command]
pub fn delete_all_history(db: State<'_, DbConnection>) -> CommandResult<Notice> {
    let form = DeleteHistoryForm {
        scope: DeleteScope::All,
    };
    Ok(form.submit(&db)?)
}
