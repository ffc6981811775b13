use session::ScreeningSession;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) session: ScreeningSession,
}
