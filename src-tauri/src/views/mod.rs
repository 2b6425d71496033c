// Views Module
// Sidebar pages rendered from the store; no state survives between renders

pub mod cards;
pub mod forms;

use serde::{Deserialize, Serialize};

use crate::state::{self, DbConnection, DbResult, MovementFilter};

pub use cards::{ComponentCard, MachineCard, MovementLine};
pub use forms::{
    AddComponentForm, AddMachineForm, DeleteHistoryForm, MoveForm, Notice, NoticeLevel,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    ComponentCards,
    MachineView,
    MoveComponent,
    HistoryLogs,
    AddMachine,
    AddComponent,
}

impl Page {
    /// Sidebar order
    pub const ALL: [Page; 6] = [
        Page::ComponentCards,
        Page::MachineView,
        Page::MoveComponent,
        Page::HistoryLogs,
        Page::AddMachine,
        Page::AddComponent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Page::ComponentCards => "Component Cards",
            Page::MachineView => "Machine View",
            Page::MoveComponent => "Move Component",
            Page::HistoryLogs => "History Logs",
            Page::AddMachine => "Add Machine",
            Page::AddComponent => "Add Component",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Page::ALL.into_iter().find(|page| page.label() == label)
    }
}

/// Sidebar entry sent to the front end
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEntry {
    pub page: Page,
    pub label: &'static str,
}

pub fn page_entries() -> Vec<PageEntry> {
    Page::ALL
        .into_iter()
        .map(|page| PageEntry {
            page,
            label: page.label(),
        })
        .collect()
}

/// Dropdown option for the component selector, keyed by serial number
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComponentOption {
    pub serial_number: String,
    pub label: String,
    pub current_machine: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "page", rename_all = "snake_case")]
pub enum PageView {
    ComponentCards {
        title: &'static str,
        cards: Vec<ComponentCard>,
    },
    MachineView {
        title: &'static str,
        cards: Vec<MachineCard>,
    },
    MoveComponent {
        title: &'static str,
        components: Vec<ComponentOption>,
        machines: Vec<String>,
    },
    HistoryLogs {
        title: &'static str,
        entries: Vec<MovementLine>,
        serials: Vec<String>,
    },
    AddMachine {
        title: &'static str,
        machines: Vec<String>,
    },
    AddComponent {
        title: &'static str,
        machines: Vec<String>,
    },
}

impl PageView {
    pub fn page(&self) -> Page {
        match self {
            PageView::ComponentCards { .. } => Page::ComponentCards,
            PageView::MachineView { .. } => Page::MachineView,
            PageView::MoveComponent { .. } => Page::MoveComponent,
            PageView::HistoryLogs { .. } => Page::HistoryLogs,
            PageView::AddMachine { .. } => Page::AddMachine,
            PageView::AddComponent { .. } => Page::AddComponent,
        }
    }
}

fn machine_names(db: &DbConnection) -> DbResult<Vec<String>> {
    Ok(state::list_machines(db)?
        .into_iter()
        .map(|machine| machine.name)
        .collect())
}

/// Run the read queries for a page and build its view model
pub fn render(db: &DbConnection, page: Page) -> DbResult<PageView> {
    let view = match page {
        Page::ComponentCards => PageView::ComponentCards {
            title: "Component Status",
            cards: cards::component_cards(db)?,
        },
        Page::MachineView => PageView::MachineView {
            title: "Machines and Their Components",
            cards: cards::machine_cards(db)?,
        },
        Page::MoveComponent => PageView::MoveComponent {
            title: "Move a Component",
            components: state::list_components(db)?
                .into_iter()
                .map(|c| ComponentOption {
                    label: format!("{} ({})", c.name, c.serial_number),
                    serial_number: c.serial_number,
                    current_machine: c.current_machine,
                })
                .collect(),
            machines: machine_names(db)?,
        },
        Page::HistoryLogs => PageView::HistoryLogs {
            title: "Movement History Log",
            entries: cards::lines(
                state::list_movements(db, &MovementFilter::all())?,
                cards::history_log_line,
            ),
            serials: state::list_logged_serials(db)?,
        },
        Page::AddMachine => PageView::AddMachine {
            title: "Add a Machine",
            machines: machine_names(db)?,
        },
        Page::AddComponent => PageView::AddComponent {
            title: "Add a Component",
            machines: machine_names(db)?,
        },
    };

    Ok(view)
}
