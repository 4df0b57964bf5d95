use super::{
    handle_class_defs::ClassDefsHandler,
    handle_error::ErrorHandler,
    handle_histo::HistoHandler,
    handle_init_ui::InitUiHandler,
    interface::{ResponseHandler, ResponseKind},
};

pub fn fab_handler(kind: ResponseKind) -> Box<dyn ResponseHandler + Send + Sync> {
    match kind {
        ResponseKind::Error => Box::new(ErrorHandler),

        ResponseKind::InitUI => Box::new(InitUiHandler),

        ResponseKind::ClassDefs => Box::new(ClassDefsHandler),

        ResponseKind::Histo => Box::new(HistoHandler),
    }
}
