mod components;
mod constants;
mod form;
mod settings_window;

pub use settings_window::run_gui;
