//! Text insertion strategies and the fallback chain that combines them.
//!
//! [`KeySynthesizer`] and [`ClipboardAccess`] calls block on the OS, so every
//! one of them runs on Tokio's blocking pool.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::{ClipboardAccess, KeySynthesizer, StrategyKind};
use crate::application::replay::{ClipboardSnapshot, InjectionError, Insertion, OutputInjector};

/// Pause between writing the clipboard and sending the paste shortcut.
const PASTE_SETTLE: Duration = Duration::from_millis(50);

/// Runs a blocking OS call off the async worker threads.
async fn blocking<T, F>(call: F) -> Result<T, InjectionError>
where
    F: FnOnce() -> Result<T, InjectionError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(call)
        .await
        .map_err(|e| InjectionError::Synthesis(format!("injection task failed: {e}")))?
}

/// One way of getting text into the focused application.
#[async_trait]
pub trait InsertStrategy: Send + Sync {
    /// Short name used in logs and [`Insertion`] records.
    fn name(&self) -> &'static str;

    async fn insert(&self, text: &str) -> Result<Insertion, InjectionError>;
}

/// Types the whole string through the synthesiser's native text input.
pub struct BulkTextStrategy {
    keys: Arc<dyn KeySynthesizer>,
}

impl BulkTextStrategy {
    pub fn new(keys: Arc<dyn KeySynthesizer>) -> Self {
        Self { keys }
    }
}

#[async_trait]
impl InsertStrategy for BulkTextStrategy {
    fn name(&self) -> &'static str {
        "bulk"
    }

    async fn insert(&self, text: &str) -> Result<Insertion, InjectionError> {
        let keys = Arc::clone(&self.keys);
        let text = text.to_owned();
        blocking(move || keys.type_text(&text)).await?;
        Ok(Insertion::Typed {
            strategy: self.name(),
        })
    }
}

/// Puts the text on the clipboard and sends the paste shortcut.
///
/// The previous clipboard text travels back in [`Insertion::Pasted`]; the
/// replay restores it after a delay, once the target has read the paste.
pub struct ClipboardPasteStrategy {
    keys: Arc<dyn KeySynthesizer>,
    clipboard: Arc<dyn ClipboardAccess>,
}

impl ClipboardPasteStrategy {
    pub fn new(keys: Arc<dyn KeySynthesizer>, clipboard: Arc<dyn ClipboardAccess>) -> Self {
        Self { keys, clipboard }
    }

    async fn put_back(&self, previous: Option<String>) {
        let clipboard = Arc::clone(&self.clipboard);
        let restored = blocking(move || match previous {
            Some(text) => clipboard.set_text(&text),
            None => clipboard.clear(),
        })
        .await;
        if let Err(e) = restored {
            warn!("failed to restore clipboard after aborted paste: {e}");
        }
    }
}

#[async_trait]
impl InsertStrategy for ClipboardPasteStrategy {
    fn name(&self) -> &'static str {
        "clipboard"
    }

    async fn insert(&self, text: &str) -> Result<Insertion, InjectionError> {
        // Best effort: an unreadable clipboard is treated as empty.
        let clipboard = Arc::clone(&self.clipboard);
        let previous = blocking(move || clipboard.get_text())
            .await
            .unwrap_or_else(|e| {
                debug!("could not snapshot clipboard: {e}");
                None
            });

        let clipboard = Arc::clone(&self.clipboard);
        let pasted = text.to_owned();
        blocking(move || clipboard.set_text(&pasted)).await?;
        sleep(PASTE_SETTLE).await;

        let keys = Arc::clone(&self.keys);
        if let Err(e) = blocking(move || keys.paste_chord()).await {
            self.put_back(previous).await;
            return Err(e);
        }

        Ok(Insertion::Pasted {
            strategy: self.name(),
            snapshot: ClipboardSnapshot::new(previous),
        })
    }
}

/// Types one code point at a time with a pause in between.
///
/// Slowest, but survives applications that drop bursts of synthetic input.
/// A code point that fails is skipped; the strategy only fails when nothing
/// could be typed at all.
pub struct PerCharStrategy {
    keys: Arc<dyn KeySynthesizer>,
    char_delay: Duration,
}

impl PerCharStrategy {
    pub fn new(keys: Arc<dyn KeySynthesizer>, char_delay: Duration) -> Self {
        Self { keys, char_delay }
    }
}

#[async_trait]
impl InsertStrategy for PerCharStrategy {
    fn name(&self) -> &'static str {
        "per-char"
    }

    async fn insert(&self, text: &str) -> Result<Insertion, InjectionError> {
        let mut typed = 0usize;
        let mut last_error = None;

        for (i, c) in text.chars().enumerate() {
            if i > 0 {
                sleep(self.char_delay).await;
            }
            let keys = Arc::clone(&self.keys);
            match blocking(move || keys.type_char(c)).await {
                Ok(()) => typed += 1,
                Err(e) => {
                    warn!("skipping {c:?}: {e}");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if typed == 0 => Err(e),
            _ => Ok(Insertion::Typed {
                strategy: self.name(),
            }),
        }
    }
}

// ── Chain ─────────────────────────────────────────────────────────────────────

/// The production [`OutputInjector`]: single keys go straight to the
/// [`KeySynthesizer`], text goes through the strategy chain.
pub struct StrategyChainInjector {
    keys: Arc<dyn KeySynthesizer>,
    clipboard: Arc<dyn ClipboardAccess>,
    strategies: Vec<Box<dyn InsertStrategy>>,
}

impl StrategyChainInjector {
    /// Creates an injector that tries `strategies` in order.
    pub fn new(
        keys: Arc<dyn KeySynthesizer>,
        clipboard: Arc<dyn ClipboardAccess>,
        strategies: Vec<Box<dyn InsertStrategy>>,
    ) -> Self {
        Self {
            keys,
            clipboard,
            strategies,
        }
    }

    /// Builds the chain from configured strategy names.
    pub fn from_kinds(
        kinds: &[StrategyKind],
        keys: Arc<dyn KeySynthesizer>,
        clipboard: Arc<dyn ClipboardAccess>,
        char_delay: Duration,
    ) -> Self {
        let strategies = kinds
            .iter()
            .map(|kind| -> Box<dyn InsertStrategy> {
                match kind {
                    StrategyKind::Bulk => Box::new(BulkTextStrategy::new(Arc::clone(&keys))),
                    StrategyKind::Clipboard => Box::new(ClipboardPasteStrategy::new(
                        Arc::clone(&keys),
                        Arc::clone(&clipboard),
                    )),
                    StrategyKind::PerChar => {
                        Box::new(PerCharStrategy::new(Arc::clone(&keys), char_delay))
                    }
                }
            })
            .collect();
        Self::new(keys, clipboard, strategies)
    }

    /// Names of the configured strategies, in order.
    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.name()).collect()
    }
}

#[async_trait]
impl OutputInjector for StrategyChainInjector {
    async fn delete_backward(&self) -> Result<(), InjectionError> {
        let keys = Arc::clone(&self.keys);
        blocking(move || keys.tap_backspace()).await
    }

    async fn insert_text(&self, text: &str) -> Result<Insertion, InjectionError> {
        let mut last_error = None;
        for strategy in &self.strategies {
            match strategy.insert(text).await {
                Ok(insertion) => {
                    if last_error.is_some() {
                        debug!(strategy = strategy.name(), "fallback strategy succeeded");
                    }
                    return Ok(insertion);
                }
                Err(e) => {
                    warn!(strategy = strategy.name(), "insertion strategy failed: {e}");
                    last_error = Some(e);
                }
            }
        }
        match last_error {
            Some(last) => Err(InjectionError::AllStrategiesFailed {
                attempts: self.strategies.len(),
                last: last.to_string(),
            }),
            None => Err(InjectionError::NoStrategies),
        }
    }

    async fn press_boundary(&self) -> Result<(), InjectionError> {
        let keys = Arc::clone(&self.keys);
        blocking(move || keys.tap_space()).await
    }

    async fn restore_clipboard(&self, snapshot: ClipboardSnapshot) -> Result<(), InjectionError> {
        let clipboard = Arc::clone(&self.clipboard);
        blocking(move || match snapshot.into_previous() {
            Some(text) => clipboard.set_text(&text),
            None => clipboard.clear(),
        })
        .await
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::output_injection::mock::{
        MockClipboard, MockKeySynthesizer, SynthesizedKey,
    };

    fn chain(
        kinds: &[StrategyKind],
        keys: &Arc<MockKeySynthesizer>,
        clipboard: &Arc<MockClipboard>,
    ) -> StrategyChainInjector {
        let keys = Arc::clone(keys) as Arc<dyn KeySynthesizer>;
        let clipboard = Arc::clone(clipboard) as Arc<dyn ClipboardAccess>;
        StrategyChainInjector::from_kinds(kinds, keys, clipboard, Duration::from_millis(20))
    }

    #[test]
    fn test_from_kinds_preserves_configured_order() {
        let keys = Arc::new(MockKeySynthesizer::new());
        let clipboard = Arc::new(MockClipboard::new());

        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        assert_eq!(injector.strategy_names(), vec!["bulk", "clipboard", "per-char"]);
    }

    #[tokio::test]
    async fn test_bulk_strategy_wins_when_it_succeeds() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new());
        let clipboard = Arc::new(MockClipboard::new());
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        // Act
        let insertion = injector.insert_text("আমার").await.unwrap();

        // Assert
        assert_eq!(insertion, Insertion::Typed { strategy: "bulk" });
        assert_eq!(keys.keys(), vec![SynthesizedKey::Text("আমার".to_string())]);
        assert_eq!(clipboard.write_count(), 0, "clipboard must stay untouched");
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_clipboard_when_bulk_fails() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new().fail_text());
        let clipboard = Arc::new(MockClipboard::with_text("user data"));
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        // Act
        let insertion = injector.insert_text("কি").await.unwrap();

        // Assert
        assert_eq!(
            insertion,
            Insertion::Pasted {
                strategy: "clipboard",
                snapshot: ClipboardSnapshot::new(Some("user data".to_string())),
            }
        );
        assert_eq!(clipboard.contents(), Some("কি".to_string()));
        assert_eq!(keys.keys(), vec![SynthesizedKey::PasteChord]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_falls_back_to_per_char_when_bulk_and_paste_fail() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new().fail_text().fail_paste());
        let clipboard = Arc::new(MockClipboard::with_text("keep me"));
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        // Act
        let insertion = injector.insert_text("কি").await.unwrap();

        // Assert
        assert_eq!(insertion, Insertion::Typed { strategy: "per-char" });
        assert_eq!(
            keys.keys(),
            vec![SynthesizedKey::Char('ক'), SynthesizedKey::Char('ি')]
        );
        assert_eq!(
            clipboard.contents(),
            Some("keep me".to_string()),
            "an aborted paste must put the clipboard back"
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_all_strategies_failing_reports_attempts() {
        let keys = Arc::new(MockKeySynthesizer::new().fail_text().fail_paste().fail_chars());
        let clipboard = Arc::new(MockClipboard::new());
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        let err = injector.insert_text("ক").await.unwrap_err();

        assert!(matches!(
            err,
            InjectionError::AllStrategiesFailed { attempts: 3, .. }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_unreadable_clipboard_is_snapshotted_as_empty() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new());
        let mut clipboard = crate::infrastructure::output_injection::MockClipboardAccess::new();
        clipboard
            .expect_get_text()
            .returning(|| Err(InjectionError::Clipboard("locked by another app".into())));
        clipboard
            .expect_set_text()
            .withf(|text| text.to_string() == "কি")
            .times(1)
            .returning(|_| Ok(()));
        let strategy = ClipboardPasteStrategy::new(
            Arc::clone(&keys) as Arc<dyn KeySynthesizer>,
            Arc::new(clipboard),
        );

        // Act
        let insertion = strategy.insert("কি").await.unwrap();

        // Assert
        assert_eq!(
            insertion,
            Insertion::Pasted {
                strategy: "clipboard",
                snapshot: ClipboardSnapshot::new(None),
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_clipboard_write_failure_falls_through() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new());
        let mut clipboard = crate::infrastructure::output_injection::MockClipboardAccess::new();
        clipboard.expect_get_text().returning(|| Ok(None));
        clipboard
            .expect_set_text()
            .returning(|_| Err(InjectionError::Clipboard("denied".into())));
        let strategy = ClipboardPasteStrategy::new(
            Arc::clone(&keys) as Arc<dyn KeySynthesizer>,
            Arc::new(clipboard),
        );

        // Act
        let result = strategy.insert("ক").await;

        // Assert
        assert_eq!(result, Err(InjectionError::Clipboard("denied".into())));
        assert!(keys.keys().is_empty(), "no paste without clipboard contents");
    }

    #[tokio::test]
    async fn test_empty_chain_reports_no_strategies() {
        let keys = Arc::new(MockKeySynthesizer::new());
        let clipboard = Arc::new(MockClipboard::new());
        let injector = chain(&[], &keys, &clipboard);

        let err = injector.insert_text("ক").await.unwrap_err();

        assert_eq!(err, InjectionError::NoStrategies);
    }

    #[tokio::test(start_paused = true)]
    async fn test_per_char_strategy_paces_code_points() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new());
        let strategy = PerCharStrategy::new(
            Arc::clone(&keys) as Arc<dyn KeySynthesizer>,
            Duration::from_millis(20),
        );
        let start = tokio::time::Instant::now();

        // Act
        strategy.insert("আমার").await.unwrap();

        // Assert: four code points, three gaps
        assert_eq!(keys.keys().len(), 4);
        assert!(start.elapsed() >= Duration::from_millis(60));
    }

    /// Records which thread each key call ran on.
    #[derive(Default)]
    struct ThreadRecordingKeys {
        threads: std::sync::Mutex<Vec<std::thread::ThreadId>>,
    }

    impl ThreadRecordingKeys {
        fn record(&self) -> Result<(), InjectionError> {
            self.threads.lock().unwrap().push(std::thread::current().id());
            Ok(())
        }
    }

    impl KeySynthesizer for ThreadRecordingKeys {
        fn tap_backspace(&self) -> Result<(), InjectionError> {
            self.record()
        }
        fn tap_space(&self) -> Result<(), InjectionError> {
            self.record()
        }
        fn paste_chord(&self) -> Result<(), InjectionError> {
            self.record()
        }
        fn type_text(&self, _text: &str) -> Result<(), InjectionError> {
            self.record()
        }
        fn type_char(&self, _c: char) -> Result<(), InjectionError> {
            self.record()
        }
    }

    #[tokio::test]
    async fn test_os_calls_run_off_the_runtime_thread() {
        // Arrange: a current-thread runtime, so the test thread is the worker
        let keys = Arc::new(ThreadRecordingKeys::default());
        let injector = StrategyChainInjector::from_kinds(
            &StrategyKind::default_chain(),
            Arc::clone(&keys) as Arc<dyn KeySynthesizer>,
            Arc::new(MockClipboard::new()),
            Duration::ZERO,
        );
        let worker = std::thread::current().id();

        // Act
        injector.delete_backward().await.unwrap();
        injector.insert_text("কি").await.unwrap();
        injector.press_boundary().await.unwrap();

        // Assert
        let threads = keys.threads.lock().unwrap().clone();
        assert_eq!(threads.len(), 3);
        assert!(threads.iter().all(|id| *id != worker));
    }

    #[tokio::test]
    async fn test_single_keys_go_straight_to_synthesizer() {
        let keys = Arc::new(MockKeySynthesizer::new());
        let clipboard = Arc::new(MockClipboard::new());
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        injector.delete_backward().await.unwrap();
        injector.press_boundary().await.unwrap();

        assert_eq!(
            keys.keys(),
            vec![SynthesizedKey::Backspace, SynthesizedKey::Space]
        );
    }

    #[tokio::test]
    async fn test_restore_clipboard_writes_snapshot_or_clears() {
        // Arrange
        let keys = Arc::new(MockKeySynthesizer::new());
        let clipboard = Arc::new(MockClipboard::with_text("pasted"));
        let injector = chain(&StrategyKind::default_chain(), &keys, &clipboard);

        // Act / Assert
        injector
            .restore_clipboard(ClipboardSnapshot::new(Some("old".to_string())))
            .await
            .unwrap();
        assert_eq!(clipboard.contents(), Some("old".to_string()));

        injector
            .restore_clipboard(ClipboardSnapshot::new(None))
            .await
            .unwrap();
        assert_eq!(clipboard.contents(), None);
    }
}
