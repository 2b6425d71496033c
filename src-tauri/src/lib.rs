// Component Tracker - components, machines and their movement log
// Module declarations

pub mod config;
pub mod state;
pub mod views;

#[cfg(feature = "desktop")]
mod commands;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use tauri::Manager;

    tauri::Builder::default()
        .setup(|app| {
            let config = config::TrackerConfig::load().map_err(|e| {
                eprintln!("Failed to load configuration: {}", e);
                e
            })?;

            app.handle().plugin(
                tauri_plugin_log::Builder::default()
                    .level(config.log_level_filter())
                    .build(),
            )?;

            // Initialize database
            let db_path = config.resolve_database_path()?;
            let db = state::init_db(&db_path, config.seed_default_components).map_err(|e| {
                log::error!("Failed to initialize database: {}", e);
                e
            })?;

            // Add database to managed state
            app.manage(db);

            log::info!("Component Tracker initialized successfully");
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            commands::list_pages,
            commands::render_page,
            commands::move_component,
            commands::add_machine,
            commands::add_component,
            commands::delete_history,
            commands::delete_all_history,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
