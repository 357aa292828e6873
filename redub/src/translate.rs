use async_trait::async_trait;
use tracing::{debug, info, warn};

use crate::config::Language;
use crate::error::{Error, Result};
use crate::process::{is_missing_tool, stderr_excerpt};

/// Translates plain text between two languages.
#[async_trait]
pub trait Translator: Send + Sync {
    async fn translate(&self, text: &str, source: &Language, target: &Language) -> Result<String>;
}

/// One way to get from the source language to the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranslationRoute {
    Direct,
    Pivot { via: Language },
}

/// Ordered routes to try: direct first, then a two-hop route through the
/// pivot language. The pivot hop is pointless when either endpoint is the
/// pivot itself, so it is only planned for distinct third languages.
pub fn plan_routes(
    source: &Language,
    target: &Language,
    pivot: &Language,
) -> Vec<TranslationRoute> {
    let mut routes = vec![TranslationRoute::Direct];
    if source != pivot && target != pivot {
        routes.push(TranslationRoute::Pivot { via: pivot.clone() });
    }
    routes
}

/// Translate `text` from `source` into `target`, trying each planned
/// route in order. The first route that succeeds wins; a failed route is
/// logged and the next one is tried.
pub async fn translate_text(
    translator: &dyn Translator,
    text: &str,
    source: &Language,
    target: &Language,
    pivot: &Language,
) -> Result<String> {
    if source == target {
        debug!(lang = %source, "source and target language match, skipping translation");
        return Ok(text.to_string());
    }

    let routes = plan_routes(source, target, pivot);
    let mut last_err: Option<Error> = None;

    for route in &routes {
        let attempt = match route {
            TranslationRoute::Direct => translator.translate(text, source, target).await,
            TranslationRoute::Pivot { via } => match translator.translate(text, source, via).await {
                Ok(intermediate) => translator.translate(&intermediate, via, target).await,
                Err(e) => Err(e),
            },
        };

        match attempt {
            Ok(translated) => {
                info!(?route, "translation succeeded");
                return Ok(translated);
            }
            Err(e) => {
                warn!(?route, error = %e, "translation route failed");
                last_err = Some(e);
            }
        }
    }

    Err(match last_err {
        Some(e) => Error::Translation(format!(
            "no translation route from \"{source}\" to \"{target}\" succeeded (last error: {e})"
        )),
        // plan_routes always yields at least one route
        None => Error::TranslationUnavailable {
            source: source.code().to_string(),
            target: target.code().to_string(),
        },
    })
}

/// Production translator backed by the argos-translate CLI.
///
/// A missing language pair surfaces as [`Error::TranslationUnavailable`]
/// so the caller can fall back to the pivot route; every other failure is
/// a plain translation error.
#[derive(Debug, Default, Clone, Copy)]
pub struct ArgosTranslate;

#[async_trait]
impl Translator for ArgosTranslate {
    async fn translate(&self, text: &str, source: &Language, target: &Language) -> Result<String> {
        debug!(source = %source, target = %target, chars = text.len(), "translating");

        let output = tokio::process::Command::new("argos-translate")
            .args(["--from-lang", source.code(), "--to-lang", target.code()])
            .arg(text)
            .output()
            .await
            .map_err(|e| {
                if is_missing_tool(&e) {
                    Error::ArgosNotFound
                } else {
                    Error::Translation(format!("failed to run argos-translate: {e}"))
                }
            })?;

        if !output.status.success() {
            return Err(classify_argos_failure(
                source,
                target,
                &stderr_excerpt(&output),
            ));
        }

        let translated = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if translated.is_empty() {
            return Err(Error::Translation(
                "argos-translate produced no output".into(),
            ));
        }

        Ok(translated)
    }
}

/// Distinguish "this language pair is not installed" from other failures.
/// Only the former should send the caller down the pivot route knowing
/// why; both are retryable through the route list either way.
fn classify_argos_failure(source: &Language, target: &Language, stderr: &str) -> Error {
    let lower = stderr.to_lowercase();
    if lower.contains("not installed") || lower.contains("no package") || lower.contains("not found")
    {
        Error::TranslationUnavailable {
            source: source.code().to_string(),
            target: target.code().to_string(),
        }
    } else {
        Error::Translation(format!("argos-translate failed: {stderr}"))
    }
}
