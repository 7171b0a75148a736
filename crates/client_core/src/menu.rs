//! Slide-out menu: open/closed state, drag geometry and page switching.

/// Menu offset from the right edge when fully open, as a fraction of page width.
pub const MENU_OPEN_FRACTION: f64 = 0.25;
/// Content panel width when fully open.
pub const CONTENT_OPEN_FRACTION: f64 = 0.251;
/// Releasing the drag this close to the right edge snaps the menu shut.
pub const SNAP_CLOSED_FRACTION: f64 = 0.029;
pub const DEFAULT_PAGE: &str = "light";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MenuState {
    #[default]
    Closed,
    Open,
}

/// Where the menu handle and content panel should be drawn, in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MenuGeometry {
    pub offset_right: f64,
    pub content_width: f64,
}

impl MenuGeometry {
    pub const CLOSED: MenuGeometry = MenuGeometry {
        offset_right: 0.0,
        content_width: 0.0,
    };

    pub fn open(page_width: f64) -> Self {
        Self {
            offset_right: page_width * MENU_OPEN_FRACTION,
            content_width: page_width * CONTENT_OPEN_FRACTION,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MenuPanel {
    state: MenuState,
    dragging: bool,
    page: String,
}

impl Default for MenuPanel {
    fn default() -> Self {
        Self::new()
    }
}

impl MenuPanel {
    pub fn new() -> Self {
        Self {
            state: MenuState::Closed,
            dragging: false,
            page: DEFAULT_PAGE.to_string(),
        }
    }

    pub fn state(&self) -> MenuState {
        self.state
    }

    pub fn page(&self) -> &str {
        &self.page
    }

    pub fn toggle(&mut self, page_width: f64) -> MenuGeometry {
        match self.state {
            MenuState::Closed => {
                self.state = MenuState::Open;
                MenuGeometry::open(page_width)
            }
            MenuState::Open => {
                self.state = MenuState::Closed;
                MenuGeometry::CLOSED
            }
        }
    }

    pub fn press(&mut self) {
        self.dragging = true;
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Follows the pointer while the handle is held; `None` when not dragging.
    pub fn drag_to(&mut self, pointer_x: f64, page_width: f64) -> Option<MenuGeometry> {
        if !self.dragging {
            return None;
        }

        let gap = page_width - pointer_x;
        if gap > page_width * MENU_OPEN_FRACTION {
            self.state = MenuState::Open;
            return Some(MenuGeometry::open(page_width));
        }
        if pointer_x >= page_width - page_width * SNAP_CLOSED_FRACTION {
            self.state = MenuState::Closed;
            return Some(MenuGeometry::CLOSED);
        }
        Some(MenuGeometry {
            offset_right: gap,
            content_width: gap,
        })
    }

    /// Switches pages and closes the menu; `None` if `name` is already shown.
    pub fn select_page(&mut self, name: &str) -> Option<MenuGeometry> {
        if self.page == name {
            return None;
        }
        self.page = name.to_string();
        self.state = MenuState::Closed;
        Some(MenuGeometry::CLOSED)
    }
}
