use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::ops::ControlFlow;
use std::thread;
use std::time::Duration;

use super::frontend::Clipboard;
use crate::error::Result;
use crate::image::{GenericImage, Image};

/// A change observed on the clipboard
#[derive(Debug, Clone, PartialEq)]
pub enum ClipboardEvent {
    TextChanged(String),
    ImageChanged(GenericImage),
}

/// Polls a clipboard and reports content changes
///
/// Content is compared by hash with the previous poll. The first poll only
/// records a baseline, so content present before watching started is not
/// reported.
#[derive(Debug)]
pub struct ClipboardWatcher {
    interval: Duration,
    text_hash: Option<u64>,
    image_hash: Option<u64>,
    primed: bool,
}

impl ClipboardWatcher {
    pub fn new(interval: Duration) -> Self {
        ClipboardWatcher {
            interval,
            text_hash: None,
            image_hash: None,
            primed: false,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Read the clipboard once and return what changed since the last poll
    pub fn poll(&mut self, clipboard: &mut Clipboard) -> Result<Vec<ClipboardEvent>> {
        let text = clipboard.get_text()?;
        let image = clipboard.get_image(false)?.and_then(Image::into_generic);

        let text_hash = text.as_deref().map(hash_text);
        let image_hash = image.as_ref().map(hash_image);

        let mut events = Vec::new();
        if self.primed {
            if let Some(text) = text
                && text_hash != self.text_hash
            {
                events.push(ClipboardEvent::TextChanged(text));
            }
            if let Some(image) = image
                && image_hash != self.image_hash
            {
                events.push(ClipboardEvent::ImageChanged(image));
            }
        } else {
            log::debug!("Clipboard watcher baseline recorded");
            self.primed = true;
        }

        self.text_hash = text_hash;
        self.image_hash = image_hash;
        Ok(events)
    }

    /// Poll on the calling thread until `handler` breaks or a read fails
    pub fn run<F>(&mut self, clipboard: &mut Clipboard, mut handler: F) -> Result<()>
    where
        F: FnMut(ClipboardEvent) -> ControlFlow<()>,
    {
        log::info!(
            "Watching {} clipboard every {:?}",
            clipboard.kind(),
            self.interval
        );
        loop {
            for event in self.poll(clipboard)? {
                if handler(event).is_break() {
                    log::info!("Clipboard watcher stopped");
                    return Ok(());
                }
            }
            thread::sleep(self.interval);
        }
    }
}

fn hash_text(text: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    text.hash(&mut hasher);
    hasher.finish()
}

fn hash_image(image: &GenericImage) -> u64 {
    let mut hasher = DefaultHasher::new();
    image.width().hash(&mut hasher);
    image.height().hash(&mut hasher);
    image.color().has_alpha().hash(&mut hasher);
    image.as_bytes().hash(&mut hasher);
    hasher.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clipboard::create_memory_backend;
    use crate::image::test_images;
    use crate::platform::BackendKind;

    fn clipboard() -> Clipboard {
        Clipboard::from_backend(create_memory_backend(BackendKind::Qt)).unwrap()
    }

    #[test]
    fn test_first_poll_is_baseline() {
        let mut cb = clipboard();
        cb.set_text("already there").unwrap();

        let mut watcher = ClipboardWatcher::new(Duration::from_millis(1));
        assert!(watcher.poll(&mut cb).unwrap().is_empty());
        assert!(watcher.poll(&mut cb).unwrap().is_empty());
    }

    #[test]
    fn test_reports_changes() {
        let mut cb = clipboard();
        let mut watcher = ClipboardWatcher::new(Duration::from_millis(1));
        watcher.poll(&mut cb).unwrap();

        cb.set_text("one").unwrap();
        assert_eq!(
            watcher.poll(&mut cb).unwrap(),
            vec![ClipboardEvent::TextChanged("one".to_string())]
        );

        let image = test_images::rgb(6, 6);
        cb.set_image(image.clone().into(), false).unwrap();
        assert_eq!(
            watcher.poll(&mut cb).unwrap(),
            vec![ClipboardEvent::ImageChanged(image)]
        );

        // Same text again after the image is still a change
        cb.set_text("one").unwrap();
        assert_eq!(watcher.poll(&mut cb).unwrap().len(), 1);
    }

    #[test]
    fn test_run_until_break() {
        let mut cb = clipboard();
        let mut watcher = ClipboardWatcher::new(Duration::from_millis(1));
        watcher.poll(&mut cb).unwrap();
        cb.set_text("stop").unwrap();

        let mut seen = Vec::new();
        watcher
            .run(&mut cb, |event| {
                seen.push(event);
                ControlFlow::Break(())
            })
            .unwrap();
        assert_eq!(seen, vec![ClipboardEvent::TextChanged("stop".to_string())]);
    }
}
