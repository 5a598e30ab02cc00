//! In-page JavaScript used to resolve locators against the live DOM.
//!
//! Each script is a self-contained IIFE evaluated with `returnByValue`, so it
//! always returns a plain JSON object (never `null`/`undefined`).

use sealcheck_core::{AppError, Locator};
use serde::Deserialize;

const SPEC_PLACEHOLDER: &str = "__SPEC__";
const BODY_PLACEHOLDER: &str = "__BODY__";

/// Shared resolver. `spec` is the serialized [`Locator`].
const RESOLVE_JS: &str = r#"
(() => {
    const spec = __SPEC__;
    const SKIP = new Set(['SCRIPT', 'STYLE', 'NOSCRIPT', 'TEMPLATE', 'HEAD']);
    const norm = (s) => (s || '').replace(/\s+/g, ' ').trim();
    const textMatches = (el, needle, exact) => {
        if (SKIP.has(el.tagName)) return false;
        const text = norm(el.textContent);
        return exact ? text === needle : text.toLowerCase().includes(needle.toLowerCase());
    };
    const resolve = () => {
        if (spec.kind === 'css') {
            return Array.from(document.querySelectorAll(spec.selector));
        }
        const needle = norm(spec.text);
        if (spec.kind === 'has_text') {
            return Array.from(document.querySelectorAll(spec.selector))
                .filter((el) => textMatches(el, needle, false));
        }
        const root = document.body || document.documentElement;
        if (!root) return [];
        // Innermost matches only: skip elements whose child already matches.
        return Array.from(root.querySelectorAll('*')).filter((el) =>
            textMatches(el, needle, spec.exact) &&
            !Array.from(el.children).some((child) => textMatches(child, needle, spec.exact)));
    };
    __BODY__
})()
"#;

const PROBE_BODY: &str = r#"
    const els = resolve();
    if (els.length === 0) {
        return { matches: 0, visible: false, opacity: null, effective_opacity: null };
    }
    const el = els[0];
    const style = getComputedStyle(el);
    const own = parseFloat(style.opacity);
    let effective = 1;
    for (let node = el; node && node.nodeType === 1; node = node.parentElement) {
        const o = parseFloat(getComputedStyle(node).opacity);
        if (!Number.isNaN(o)) effective *= o;
    }
    const rendered = typeof el.checkVisibility === 'function'
        ? el.checkVisibility({ visibilityProperty: true })
        : style.display !== 'none' && style.visibility !== 'hidden';
    const rect = el.getBoundingClientRect();
    const inViewport = rect.width > 0 && rect.height > 0
        && rect.bottom > 0 && rect.right > 0
        && rect.top < window.innerHeight && rect.left < window.innerWidth;
    return {
        matches: els.length,
        visible: el.isConnected && rendered && inViewport,
        opacity: Number.isNaN(own) ? 1 : own,
        effective_opacity: effective,
    };
"#;

const CLICK_TARGET_BODY: &str = r#"
    const el = resolve()[0];
    if (!el) return { found: false, x: 0, y: 0 };
    el.scrollIntoView({ block: 'center', inline: 'center', behavior: 'instant' });
    const rect = el.getBoundingClientRect();
    return { found: true, x: rect.left + rect.width / 2, y: rect.top + rect.height / 2 };
"#;

/// Viewport coordinates of the first match's centre.
#[derive(Debug, Clone, Copy, Deserialize)]
pub(crate) struct ClickTarget {
    pub found: bool,
    pub x: f64,
    pub y: f64,
}

fn build(locator: &Locator, body: &str) -> Result<String, AppError> {
    // JSON is a valid JS literal, so the locator is embedded without escaping issues.
    let spec = serde_json::to_string(locator)?;
    Ok(RESOLVE_JS
        .replace(BODY_PLACEHOLDER, body)
        .replace(SPEC_PLACEHOLDER, &spec))
}

/// Script returning an [`sealcheck_core::ElementProbe`] for the locator.
pub(crate) fn probe(locator: &Locator) -> Result<String, AppError> {
    build(locator, PROBE_BODY)
}

/// Script that scrolls the first match into view and returns a [`ClickTarget`].
pub(crate) fn click_target(locator: &Locator) -> Result<String, AppError> {
    build(locator, CLICK_TARGET_BODY)
}
