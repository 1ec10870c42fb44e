pub mod controller;
pub mod csv;
pub mod domain;
pub mod explorer;
pub mod inputter;
pub mod model;
pub mod prefs;
pub mod record;
pub mod source;
pub mod stats;
pub mod tasks;
pub mod theme;
pub mod ui;
pub mod view;
