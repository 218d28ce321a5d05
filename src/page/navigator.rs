//! # Navigator
//!
//! Owns the current page, a single-level return page, the registry of instantiated pages and the
//! modal stack. All methods run on the UI thread.

use crate::bridge::RedrawSignal;
use crate::page::{Modal, NavAction, Page, UiInput};

use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Layers to composite for one frame, bottom to top
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Frame {
    pub page: Option<String>,
    pub modals: Vec<String>,
    /// Whether anything requested a redraw since the previous frame.
    pub redraw: bool,
}

pub struct Navigator {
    pages: HashMap<String, Box<dyn Page>>,
    current: Option<String>,
    /// Only one level of history is kept.
    return_page: Option<String>,
    modals: Vec<Box<dyn Modal>>,
    redraw: Arc<RedrawSignal>,
}

impl Navigator {
    pub fn new(redraw: Arc<RedrawSignal>) -> Self {
        Self {
            pages: HashMap::new(),
            current: None,
            return_page: None,
            modals: Vec::new(),
            redraw,
        }
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn return_page(&self) -> Option<&str> {
        self.return_page.as_deref()
    }

    pub fn has_page(&self, id: &str) -> bool {
        self.pages.contains_key(id)
    }

    pub fn modal_count(&self) -> usize {
        self.modals.len()
    }

    pub fn top_modal_id(&self) -> Option<&str> {
        self.modals.last().map(|modal| modal.id())
    }

    /// Close the current page, store `page` under `id`, resume it and make it current.
    ///
    /// The previous current id becomes the return page. A page already registered under `id`
    /// is replaced without being closed again; only the current page is ever resumed.
    pub fn change_fragment(&mut self, page: Box<dyn Page>, id: impl Into<String>) {
        let id = id.into();

        if let Some(previous) = self.close_current() {
            if previous != id {
                self.return_page = Some(previous);
            }
        }

        if self.pages.insert(id.clone(), page).is_some() {
            debug!("Replacing registered page {}", id);
        }
        self.resume(&id);
        info!("Changed page to {}", id);
    }

    /// Set the page [`pop_fragment`](Self::pop_fragment) returns to.
    pub fn set_return_page(&mut self, from: impl Into<String>) {
        self.return_page = Some(from.into());
    }

    /// Go back to the return page. Returns false and stays put when there is none or it is no
    /// longer registered.
    pub fn pop_fragment(&mut self) -> bool {
        let Some(target) = self.return_page.clone() else {
            debug!("No return page to pop to");
            return false;
        };
        if !self.pages.contains_key(&target) {
            warn!("Return page {} is not registered, staying on current page", target);
            return false;
        }
        if self.current.as_deref() == Some(target.as_str()) {
            self.return_page = None;
            return false;
        }

        self.close_current();
        self.return_page = None;
        self.resume(&target);
        info!("Popped back to {}", target);
        true
    }

    /// Push a modal above the current page and any open modals.
    pub fn show_modal(&mut self, modal: Box<dyn Modal>) {
        debug!("Showing modal {}", modal.id());
        self.modals.push(modal);
        self.redraw.request();
    }

    /// Dismiss the top modal. Returns false when no modal is open.
    pub fn dismiss_modal(&mut self) -> bool {
        match self.modals.pop() {
            Some(mut modal) => {
                modal.on_dismiss();
                debug!("Dismissed modal {}", modal.id());
                self.redraw.request();
                true
            }
            None => false,
        }
    }

    /// Route one input to the top modal, or to the current page when no modal is open, and
    /// apply the navigation it asks for.
    pub fn handle_input(&mut self, input: &UiInput) {
        let action = if let Some(modal) = self.modals.last_mut() {
            modal.handle(input)
        } else if let Some(id) = self.current.as_ref() {
            self.pages.get_mut(id).and_then(|page| page.handle(input))
        } else {
            None
        };

        if let Some(action) = action {
            self.apply(action);
        }
    }

    pub fn apply(&mut self, action: NavAction) {
        debug!("Applying {:?}", action);
        match action {
            NavAction::ChangeFragment { page, id } => self.change_fragment(page, id),
            NavAction::PopFragment => {
                self.pop_fragment();
            }
            NavAction::SetReturnPage(id) => self.set_return_page(id),
            NavAction::ShowModal(modal) => self.show_modal(modal),
            NavAction::DismissModal => {
                self.dismiss_modal();
            }
        }
    }

    /// Layers for the next frame; consumes the pending redraw request.
    pub fn frame(&self) -> Frame {
        Frame {
            page: self.current.clone(),
            modals: self.modals.iter().map(|modal| modal.id().to_string()).collect(),
            redraw: self.redraw.take(),
        }
    }

    /// Text rendition of the current page, if any.
    pub fn render_current(&self) -> Option<String> {
        let id = self.current.as_ref()?;
        self.pages.get(id).map(|page| page.render())
    }

    /// Dismiss every modal top-first, then close the current page.
    pub fn shutdown(&mut self) {
        while self.dismiss_modal() {}
        self.close_current();
        self.return_page = None;
        info!("Navigator shut down");
    }

    fn close_current(&mut self) -> Option<String> {
        let current = self.current.take()?;
        if let Some(page) = self.pages.get_mut(&current) {
            page.on_close();
        }
        Some(current)
    }

    fn resume(&mut self, id: &str) {
        if let Some(page) = self.pages.get_mut(id) {
            page.on_resume();
            self.current = Some(id.to_string());
            self.redraw.request();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    type Log = Rc<RefCell<Vec<String>>>;

    struct TestPage {
        name: &'static str,
        log: Log,
        on_back: bool,
    }

    impl TestPage {
        fn boxed(name: &'static str, log: &Log) -> Box<dyn Page> {
            Box::new(Self {
                name,
                log: log.clone(),
                on_back: false,
            })
        }
    }

    impl Page for TestPage {
        fn on_resume(&mut self) {
            self.log.borrow_mut().push(format!("{}:resume", self.name));
        }

        fn handle(&mut self, input: &UiInput) -> Option<NavAction> {
            self.log.borrow_mut().push(format!("{}:handle", self.name));
            match input {
                UiInput::Back if self.on_back => Some(NavAction::PopFragment),
                UiInput::Activate(target) if target == "dialog" => {
                    Some(NavAction::ShowModal(TestModal::boxed("dialog", &self.log)))
                }
                _ => None,
            }
        }

        fn on_close(&mut self) {
            self.log.borrow_mut().push(format!("{}:close", self.name));
        }
    }

    struct TestModal {
        id: &'static str,
        log: Log,
    }

    impl TestModal {
        fn boxed(id: &'static str, log: &Log) -> Box<dyn Modal> {
            Box::new(Self {
                id,
                log: log.clone(),
            })
        }
    }

    impl Modal for TestModal {
        fn id(&self) -> &str {
            self.id
        }

        fn handle(&mut self, input: &UiInput) -> Option<NavAction> {
            self.log.borrow_mut().push(format!("{}:handle", self.id));
            match input {
                UiInput::Back => Some(NavAction::DismissModal),
                _ => None,
            }
        }

        fn on_dismiss(&mut self) {
            self.log.borrow_mut().push(format!("{}:dismiss", self.id));
        }
    }

    fn count(log: &Log, entry: &str) -> usize {
        log.borrow().iter().filter(|e| *e == entry).count()
    }

    fn navigator() -> Navigator {
        Navigator::new(Arc::new(RedrawSignal::new()))
    }

    #[test]
    fn test_change_then_pop_returns_to_previous() {
        let log = Log::default();
        let mut nav = navigator();

        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.change_fragment(TestPage::boxed("B", &log), "B");
        assert!(nav.pop_fragment());

        assert_eq!(nav.current_id(), Some("A"));
        assert_eq!(count(&log, "A:resume"), 2);
        assert_eq!(count(&log, "B:close"), 1);
        assert_eq!(
            *log.borrow(),
            vec!["A:resume", "A:close", "B:resume", "B:close", "A:resume"]
        );
    }

    #[test]
    fn test_pop_keeps_single_level() {
        let log = Log::default();
        let mut nav = navigator();

        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.change_fragment(TestPage::boxed("B", &log), "B");
        nav.change_fragment(TestPage::boxed("C", &log), "C");
        assert_eq!(nav.return_page(), Some("B"));

        assert!(nav.pop_fragment());
        assert_eq!(nav.current_id(), Some("B"));
        assert!(!nav.pop_fragment());
        assert_eq!(nav.current_id(), Some("B"));
    }

    #[test]
    fn test_pop_to_unregistered_page_is_noop() {
        let log = Log::default();
        let mut nav = navigator();

        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.set_return_page("settings");
        assert!(!nav.pop_fragment());
        assert_eq!(nav.current_id(), Some("A"));
        assert_eq!(count(&log, "A:close"), 0);

        let mut empty = navigator();
        assert!(!empty.pop_fragment());
        assert_eq!(empty.current_id(), None);
    }

    #[test]
    fn test_close_runs_before_resume() {
        let log = Log::default();
        let mut nav = navigator();

        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.change_fragment(TestPage::boxed("A2", &log), "A");

        assert_eq!(*log.borrow(), vec!["A:resume", "A:close", "A2:resume"]);
        assert_eq!(nav.return_page(), None);
    }

    #[test]
    fn test_modals_intercept_input_and_dismiss_lifo() {
        let log = Log::default();
        let mut nav = navigator();
        nav.change_fragment(TestPage::boxed("A", &log), "A");

        nav.handle_input(&UiInput::Activate("dialog".to_string()));
        nav.show_modal(TestModal::boxed("confirm", &log));
        assert_eq!(nav.modal_count(), 2);
        assert_eq!(nav.top_modal_id(), Some("confirm"));

        log.borrow_mut().clear();
        nav.handle_input(&UiInput::Back);
        nav.handle_input(&UiInput::Back);
        nav.handle_input(&UiInput::Frame);

        assert_eq!(
            *log.borrow(),
            vec![
                "confirm:handle",
                "confirm:dismiss",
                "dialog:handle",
                "dialog:dismiss",
                "A:handle",
            ]
        );
        assert!(!nav.dismiss_modal());
    }

    #[test]
    fn test_page_can_request_pop() {
        let log = Log::default();
        let mut nav = navigator();
        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.change_fragment(
            Box::new(TestPage {
                name: "B",
                log: log.clone(),
                on_back: true,
            }),
            "B",
        );

        nav.handle_input(&UiInput::Back);
        assert_eq!(nav.current_id(), Some("A"));
    }

    #[test]
    fn test_frame_lists_layers_and_redraw() {
        let log = Log::default();
        let mut nav = navigator();
        assert_eq!(nav.frame(), Frame::default());

        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.show_modal(TestModal::boxed("dialog", &log));

        let frame = nav.frame();
        assert_eq!(frame.page.as_deref(), Some("A"));
        assert_eq!(frame.modals, vec!["dialog".to_string()]);
        assert!(frame.redraw);
        assert!(!nav.frame().redraw);
    }

    #[test]
    fn test_shutdown_dismisses_then_closes() {
        let log = Log::default();
        let mut nav = navigator();
        nav.change_fragment(TestPage::boxed("A", &log), "A");
        nav.show_modal(TestModal::boxed("first", &log));
        nav.show_modal(TestModal::boxed("second", &log));
        log.borrow_mut().clear();

        nav.shutdown();

        assert_eq!(
            *log.borrow(),
            vec!["second:dismiss", "first:dismiss", "A:close"]
        );
        assert_eq!(nav.current_id(), None);
        assert_eq!(nav.modal_count(), 0);
    }
}
