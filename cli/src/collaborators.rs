use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use snapday_journal::JournalError;
use snapday_journal::Result;
use snapday_journal::collaborators::CaptureSource;
use snapday_journal::collaborators::Notifier;
use snapday_journal::countdown::CountdownView;
use snapday_journal::timelapse::FrameSink;
use snapday_journal::types::ImageRef;

/// Stands in for the webcam: the "capture" is an image file on disk.
pub struct FileCapture {
    path: PathBuf,
}

impl FileCapture {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CaptureSource for FileCapture {
    fn capture(&self) -> Result<ImageRef> {
        let mime = mime_guess::from_path(&self.path)
            .first()
            .filter(|m| m.type_() == mime_guess::mime::IMAGE)
            .ok_or_else(|| {
                JournalError::CaptureUnavailable(format!(
                    "{} is not an image file",
                    self.path.display()
                ))
            })?;
        let bytes = std::fs::read(&self.path).map_err(|e| {
            JournalError::CaptureUnavailable(format!("read {}: {e}", self.path.display()))
        })?;
        Ok(ImageRef::from_bytes(mime.essence_str(), &bytes))
    }
}

/// Prints notifications to stdout.
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, title: &str, message: &str) {
        println!("[{title}] {message}");
    }
}

/// Single-line countdown redrawn in place.
pub struct TerminalView;

impl CountdownView for TerminalView {
    fn render(&self, remaining: &str) {
        let mut out = std::io::stdout().lock();
        let _ = write!(out, "\rNext entry available in {remaining}");
        let _ = out.flush();
    }

    fn dismiss(&self) {
        println!();
    }

    fn alert(&self, message: &str) {
        println!("{message}");
    }
}

/// Writes numbered frames plus an ffmpeg concat manifest into a directory.
pub struct FrameDirSink {
    dir: PathBuf,
    lines: Vec<String>,
}

impl FrameDirSink {
    pub const MANIFEST: &'static str = "timelapse.txt";

    pub fn create(dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(dir).map_err(|e| {
            JournalError::StorageUnavailable(format!("create_dir_all {}: {e}", dir.display()))
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            lines: vec!["ffconcat version 1.0".to_string()],
        })
    }
}

fn extension_for(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        "image/webp" => "webp",
        "image/gif" => "gif",
        other => mime_guess::get_mime_extensions_str(other)
            .and_then(|exts| exts.first().copied())
            .unwrap_or("bin"),
    }
}

impl FrameSink for FrameDirSink {
    type Output = (usize, PathBuf);

    fn push_frame(&mut self, index: usize, image: &ImageRef, delay: Duration) -> Result<()> {
        let name = format!("frame_{:04}.{}", index + 1, extension_for(image.mime()?));
        let path = self.dir.join(&name);
        std::fs::write(&path, image.decode()?).map_err(|e| {
            JournalError::StorageUnavailable(format!("write {}: {e}", path.display()))
        })?;
        self.lines.push(format!("file '{name}'"));
        self.lines.push(format!("duration {}", delay.as_secs_f64()));
        Ok(())
    }

    fn finish(self) -> Result<Self::Output> {
        let frames = (self.lines.len() - 1) / 2;
        let manifest = self.dir.join(Self::MANIFEST);
        let mut body = self.lines.join("\n");
        body.push('\n');
        std::fs::write(&manifest, body).map_err(|e| {
            JournalError::StorageUnavailable(format!("write {}: {e}", manifest.display()))
        })?;
        Ok((frames, manifest))
    }
}
