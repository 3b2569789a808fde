use super::backend::NativeClipboard;
use crate::error::Result;

#[derive(Debug, Clone)]
enum Content<I> {
    Text(String),
    Image(I),
}

/// Process-local clipboard holding one text or one image
///
/// Stands in for a toolkit handle where no display is available (headless
/// runs, tests). Like a real clipboard, every write replaces what was there.
#[derive(Debug, Clone)]
pub struct MemoryClipboard<I> {
    content: Option<Content<I>>,
    writes: usize,
}

impl<I> MemoryClipboard<I> {
    pub fn new() -> Self {
        MemoryClipboard {
            content: None,
            writes: 0,
        }
    }

    /// Number of writes performed so far
    pub fn writes(&self) -> usize {
        self.writes
    }

    /// Drop whatever the clipboard holds
    pub fn clear(&mut self) {
        self.content = None;
    }
}

impl<I> Default for MemoryClipboard<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: Clone> NativeClipboard for MemoryClipboard<I> {
    type Image = I;

    fn read_text(&mut self) -> Result<Option<String>> {
        Ok(match &self.content {
            Some(Content::Text(text)) => Some(text.clone()),
            _ => None,
        })
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.content = Some(Content::Text(text.to_string()));
        self.writes += 1;
        Ok(())
    }

    fn read_image(&mut self) -> Result<Option<I>> {
        Ok(match &self.content {
            Some(Content::Image(image)) => Some(image.clone()),
            _ => None,
        })
    }

    fn write_image(&mut self, image: I) -> Result<()> {
        self.content = Some(Content::Image(image));
        self.writes += 1;
        Ok(())
    }
}
