//! Overlay panels and their toggle rules

/// Panels that can be open over the map
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    Inventory,
    Equipment,
    QuestLog,
    Generator,
    Dialog,
    SystemMenu,
}

/// Visibility of every panel
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Panels {
    pub inventory: bool,
    pub equipment: bool,
    pub quest_log: bool,
    pub generator: bool,
    pub dialog: bool,
    pub system_menu: bool,
}

impl Panels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_open(&self, panel: Panel) -> bool {
        match panel {
            Panel::Inventory => self.inventory,
            Panel::Equipment => self.equipment,
            Panel::QuestLog => self.quest_log,
            Panel::Generator => self.generator,
            Panel::Dialog => self.dialog,
            Panel::SystemMenu => self.system_menu,
        }
    }

    /// Dialog and the system menu take all input and pause the world
    pub fn is_modal(&self) -> bool {
        self.dialog || self.system_menu
    }

    pub fn any_open(&self) -> bool {
        self.inventory || self.equipment || self.quest_log || self.generator || self.is_modal()
    }

    /// `i` / `e`: inventory and equipment open and close together
    pub fn toggle_inventory(&mut self) {
        let show = !(self.inventory || self.equipment);
        self.inventory = show;
        self.equipment = show;
        self.generator = false;
    }

    /// `q`
    pub fn toggle_quest_log(&mut self) {
        self.quest_log = !self.quest_log;
    }

    /// `g`: the generator sits next to the inventory, in place of equipment
    pub fn toggle_generator(&mut self) {
        self.generator = !self.generator;
        if self.generator {
            self.inventory = true;
            self.equipment = false;
        }
    }

    /// `Esc`: closes a dialog first, otherwise flips the system menu
    pub fn escape(&mut self) {
        if self.dialog {
            self.dialog = false;
        } else {
            self.system_menu = !self.system_menu;
        }
    }

    pub fn open_dialog(&mut self) {
        self.dialog = true;
    }

    pub fn close_dialog(&mut self) {
        self.dialog = false;
    }

    pub fn close_all(&mut self) {
        *self = Self::default();
    }
}
