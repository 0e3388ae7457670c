use ratatui::Frame;

use crate::{
    app::{App, AppState},
    ui::{profile::ProfileView, ResultsView, SetupView, TypingView},
};

/// A UI Screen boundary: responsible for rendering one app state
pub trait Screen {
    fn render(&self, app: &App, f: &mut Frame);
}

pub struct SetupScreen;

impl Screen for SetupScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(SetupView(app), f.area());
    }
}

pub struct TypingScreen;

impl Screen for TypingScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(TypingView(app), f.area());
    }
}

pub struct ResultsScreen;

impl Screen for ResultsScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(ResultsView(app), f.area());
    }
}

pub struct ProfileScreen;

impl Screen for ProfileScreen {
    fn render(&self, app: &App, f: &mut Frame) {
        f.render_widget(ProfileView(app), f.area());
    }
}

/// Helper to construct the appropriate screen for the current state
pub fn current_screen(state: &AppState) -> Box<dyn Screen> {
    match state {
        AppState::Setup => Box::new(SetupScreen),
        AppState::Typing => Box::new(TypingScreen),
        AppState::Results => Box::new(ResultsScreen),
        AppState::Profile => Box::new(ProfileScreen),
    }
}
