use crossterm::event::KeyEvent;

/// Terminal-side events fed into the main loop. `Init` fires exactly
/// once, before the first tick, and drives the initial page load.
#[derive(Debug, Clone)]
pub enum Event {
    Init,
    Tick,
    Render,
    Key(KeyEvent),
}
