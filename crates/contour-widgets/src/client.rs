//! Wiring widgets into an injected [`FrameScheduler`]

use contour_core::frame::{FrameCallbackId, FrameInfo, FrameScheduler};
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// A widget that rebuilds derived data once per frame
pub trait FrameClient {
    /// Drain dirty state and rebuild render buffers
    fn on_frame(&mut self, frame: &FrameInfo);

    /// True while there is dirty state for the next frame
    fn needs_frame(&self) -> bool;
}

/// A widget registered with a scheduler
pub struct ClientHandle<C> {
    id: FrameCallbackId,
    client: Rc<RefCell<C>>,
}

/// Register `client` under `name`
///
/// The scheduler only holds a weak reference; dropping the last strong
/// reference turns the callback into a no-op until it is unregistered.
pub fn register_client<C>(
    scheduler: &mut dyn FrameScheduler,
    name: &str,
    client: Rc<RefCell<C>>,
) -> ClientHandle<C>
where
    C: FrameClient + 'static,
{
    let weak: Weak<RefCell<C>> = Rc::downgrade(&client);
    let label = name.to_string();
    let id = scheduler.register(
        name,
        Box::new(move |frame| {
            let Some(client) = weak.upgrade() else {
                return;
            };
            let borrowed = client.try_borrow_mut();
            match borrowed {
                Ok(mut client) => client.on_frame(frame),
                Err(_) => log::warn!("register_client: '{}' busy during frame {}", label, frame.frame),
            };
        }),
    );
    ClientHandle { id, client }
}

impl<C: FrameClient> ClientHandle<C> {
    pub fn id(&self) -> FrameCallbackId {
        self.id
    }

    pub fn client(&self) -> &Rc<RefCell<C>> {
        &self.client
    }

    /// Ask for a frame if the widget has dirty state. Returns true if requested.
    pub fn request_if_needed(&self, scheduler: &mut dyn FrameScheduler) -> bool {
        let needed = self.client.borrow().needs_frame();
        if needed {
            scheduler.request_frame(self.id);
        }
        needed
    }

    pub fn unregister(self, scheduler: &mut dyn FrameScheduler) -> bool {
        scheduler.unregister(self.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::TimelineEditor;
    use contour_core::config::EditorConfig;
    use contour_core::frame::FrameLoop;
    use std::time::Instant;

    #[test]
    fn test_many_edits_one_rebuild() {
        let mut frames = FrameLoop::new();
        let editor = Rc::new(RefCell::new(TimelineEditor::control_line(&EditorConfig::default())));
        let handle = register_client(&mut frames, "curve", editor.clone());

        for i in 0..20 {
            editor.borrow_mut().timeline_mut().update_value(0, i as f64 / 40.0);
            handle.request_if_needed(&mut frames);
        }
        assert_eq!(frames.run_frame(Instant::now()), 1);
        assert!(!editor.borrow().needs_frame());

        // Clean widget asks for nothing
        assert!(!handle.request_if_needed(&mut frames));
        assert_eq!(frames.run_frame(Instant::now()), 0);
    }

    #[test]
    fn test_busy_client_skips_frame() {
        let mut frames = FrameLoop::new();
        let editor = Rc::new(RefCell::new(TimelineEditor::control_line(&EditorConfig::default())));
        let handle = register_client(&mut frames, "curve", editor.clone());

        handle.request_if_needed(&mut frames);
        {
            let _held = editor.borrow_mut();
            assert_eq!(frames.run_frame(Instant::now()), 1, "Callback runs without panicking");
        }
        assert!(editor.borrow().needs_frame(), "Busy widget keeps its dirty state");

        handle.request_if_needed(&mut frames);
        frames.run_frame(Instant::now());
        assert!(!editor.borrow().needs_frame());
    }

    #[test]
    fn test_dropped_client_is_skipped() {
        let mut frames = FrameLoop::new();
        let editor = Rc::new(RefCell::new(TimelineEditor::control_line(&EditorConfig::default())));
        let handle = register_client(&mut frames, "curve", editor.clone());
        let id = handle.id();
        drop(handle);
        drop(editor);

        frames.request_frame(id);
        assert_eq!(frames.run_frame(Instant::now()), 1, "Callback runs but does nothing");
        assert!(frames.unregister(id));
    }
}
