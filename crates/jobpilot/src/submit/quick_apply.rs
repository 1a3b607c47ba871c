//! Production quick-apply driver.
//!
//! Implements `QuickApplyDriver` against a real browser over the
//! WebDriver bridge. All site-specific knowledge lives here: the
//! session cookie, the entry-point control, the multi-step modal, and
//! the confirmation indicator. Button discovery runs as injected
//! JavaScript matched on aria-labels and visible text, which survives
//! the site's frequent class-name churn better than CSS selectors.

use std::time::{Duration, Instant};

use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tracing::debug;

use async_trait::async_trait;

use crate::config::SubmitConfig;

use super::driver::{EntryPoint, FieldKind, FormField, NavAction, QuickApplyDriver, SessionState};
use super::webdriver::WebDriverClient;
use super::SubmitError;

const POLL_INTERVAL_MS: u64 = 500;
const MODAL_SELECTOR: &str = "div[role='dialog'], .jobs-easy-apply-modal";

/// Finds a visible, enabled quick-apply entry button.
const FIND_ENTRY_JS: &str = r#"
    const btns = Array.from(document.querySelectorAll('button')).filter(b => {
        const r = b.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && !b.disabled;
    });
    const btn = btns.find(b => {
        const al  = (b.getAttribute('aria-label') || '').toLowerCase();
        const txt = b.innerText.toLowerCase().trim();
        return al.includes('easy apply') || txt === 'easy apply';
    });
    return btn !== undefined;
"#;

const CLICK_ENTRY_JS: &str = r#"
    const btns = Array.from(document.querySelectorAll('button'));
    const btn = btns.find(b => {
        const al  = (b.getAttribute('aria-label') || '').toLowerCase();
        const txt = b.innerText.toLowerCase().trim();
        return al.includes('easy apply') || txt === 'easy apply';
    });
    if (btn) { btn.click(); return true; }
    return false;
"#;

/// The dialog must contain actual form content - not a nav dropdown or
/// unrelated overlay that happens to be role=dialog.
const HAS_FORM_CONTENT_JS: &str = r#"
    const el = document.querySelector("div[role='dialog'], .jobs-easy-apply-modal");
    if (!el) return false;
    const hasInput = el.querySelector('input, select, textarea') !== null;
    const hasBtns  = el.querySelector(
        'button[aria-label*="apply" i], button[aria-label*="next" i], ' +
        'button[aria-label*="submit" i], button[aria-label*="continue" i], ' +
        'button[aria-label*="review" i]'
    ) !== null;
    const hasFile = el.querySelector('input[type="file"]') !== null;
    return hasInput || hasBtns || hasFile;
"#;

/// Walks the current step's form groups, tags each input with a
/// driver-scoped handle, and returns the field declarations.
const SCAN_FIELDS_JS: &str = r#"
    const modal = document.querySelector("div[role='dialog'], .jobs-easy-apply-modal");
    if (!modal) return [];
    const groups = modal.querySelectorAll(
        '.jobs-easy-apply-form-section__grouping, .fb-form-element, [data-test-form-element]'
    );
    const fields = [];
    let handle = 0;
    groups.forEach(group => {
        const labelEl = group.querySelector('label, .fb-form-element-label, [data-test-form-element-label]');
        const label = labelEl ? labelEl.innerText.trim() : '';
        const radios = Array.from(group.querySelectorAll("input[type='radio']"));
        if (radios.length > 0) {
            radios.forEach(r => r.setAttribute('data-jp-field', String(handle)));
            const options = radios.map(r => {
                const rl = document.querySelector("label[for='" + r.id + "']");
                return rl ? rl.innerText.trim() : (r.value || '');
            });
            fields.push({handle: String(handle), label, kind: 'radio', options});
            handle += 1;
            return;
        }
        const inputs = group.querySelectorAll(
            "input:not([type='hidden']):not([type='file']):not([type='radio']), select, textarea"
        );
        inputs.forEach(input => {
            input.setAttribute('data-jp-field', String(handle));
            const tag = input.tagName.toLowerCase();
            let kind = 'text';
            let options = [];
            if (tag === 'select') {
                kind = 'select';
                options = Array.from(input.querySelectorAll('option')).map(o => o.innerText.trim());
            } else if (tag === 'textarea') {
                kind = 'textarea';
            } else if ((input.getAttribute('type') || 'text') === 'checkbox') {
                kind = 'checkbox';
            }
            fields.push({handle: String(handle), label, kind, options});
            handle += 1;
        });
    });
    return fields;
"#;

/// Selects the option whose text matches the value (either direction),
/// falling back to the first non-empty option.
const FILL_SELECT_JS: &str = r#"
    const sel = document.querySelector("[data-jp-field='" + arguments[0] + "']");
    if (!sel) return false;
    const value = arguments[1].toLowerCase();
    const options = Array.from(sel.querySelectorAll('option'));
    let chosen = options.find(o => {
        const t = o.innerText.toLowerCase().trim();
        return t.length > 0 && (t.includes(value) || value.includes(t));
    });
    if (!chosen && options.length > 1) chosen = options[1];
    if (!chosen) return false;
    sel.value = chosen.value;
    sel.dispatchEvent(new Event('change', {bubbles: true}));
    return true;
"#;

const FILL_CHECKBOX_JS: &str = r#"
    const box = document.querySelector("[data-jp-field='" + arguments[0] + "']");
    if (!box) return false;
    const want = ['yes', 'true', '1'].includes(arguments[1].toLowerCase());
    if (want !== box.checked) box.click();
    return true;
"#;

/// Clicks the radio whose label matches the value, else the first one.
const FILL_RADIO_JS: &str = r#"
    const radios = Array.from(document.querySelectorAll("input[data-jp-field='" + arguments[0] + "']"));
    if (radios.length === 0) return false;
    const value = arguments[1].toLowerCase();
    for (const radio of radios) {
        const rl = document.querySelector("label[for='" + radio.id + "']");
        const t = rl ? rl.innerText.toLowerCase().trim() : '';
        if (t.length > 0 && (t.includes(value) || value.includes(t))) {
            radio.click();
            return true;
        }
    }
    radios[0].click();
    return true;
"#;

/// Classifies the primary navigation button of the modal footer.
/// Clicks next/review itself; never clicks submit (the engine decides
/// whether a true submission happens).
const ADVANCE_JS: &str = r#"
    const SUBMIT_LABELS = ['submit application', 'submit'];
    const REVIEW_LABELS = ['review your application', 'review'];
    const NEXT_LABELS   = ['continue to next step', 'next', 'continue', 'next step'];
    const allBtns = Array.from(document.querySelectorAll('button')).filter(b => {
        const r = b.getBoundingClientRect();
        return r.width > 0 && r.height > 0 && !b.disabled;
    });
    function matchBtn(labels) {
        return allBtns.find(b => {
            const al  = (b.getAttribute('aria-label') || '').toLowerCase().trim();
            const txt = b.innerText.toLowerCase().trim();
            return labels.some(l => al === l || txt === l || al.startsWith(l) || txt.startsWith(l));
        });
    }
    if (matchBtn(SUBMIT_LABELS)) return 'submit';
    const review = matchBtn(REVIEW_LABELS);
    if (review) { review.click(); return 'review'; }
    const next = matchBtn(NEXT_LABELS);
    if (next) { next.click(); return 'next'; }
    return 'stuck';
"#;

const SUBMIT_JS: &str = r#"
    const labels = ['submit application', 'submit'];
    const btns = Array.from(document.querySelectorAll('button'));
    const btn = btns.find(b => {
        const al  = (b.getAttribute('aria-label') || '').toLowerCase().trim();
        const txt = b.innerText.toLowerCase().trim();
        return labels.some(l => al === l || txt === l || al.startsWith(l) || txt.startsWith(l));
    });
    if (btn) { btn.click(); return true; }
    return false;
"#;

/// Post-submission success indicator: a confirmation dialog or inline
/// "application sent" marker.
const CONFIRM_JS: &str = r#"
    const texts = ['application sent', 'application submitted', 'your application was sent'];
    const body = document.body.innerText.toLowerCase();
    if (texts.some(t => body.includes(t))) return true;
    return document.querySelector('.artdeco-inline-feedback--success, [data-test-modal*="post-apply" i]') !== null;
"#;

const CLOSE_MODAL_JS: &str = r#"
    const dismissLabels = ['dismiss', 'close', 'discard'];
    const btns = Array.from(document.querySelectorAll('button'));
    const btn = btns.find(b => {
        const al  = (b.getAttribute('aria-label') || '').toLowerCase();
        const txt = b.innerText.toLowerCase().trim();
        return dismissLabels.some(l => al.includes(l) || txt === l);
    });
    if (btn) { btn.click(); return true; }
    return false;
"#;

pub struct QuickApplyFlow {
    client: WebDriverClient,
    site_url: String,
    cookie_name: String,
    cookie_domain: String,
    session_token: SecretString,
    nav_timeout: Duration,
}

impl QuickApplyFlow {
    /// Connects to the WebDriver endpoint and starts a browser session.
    pub async fn connect(
        config: &SubmitConfig,
        session_token: SecretString,
    ) -> Result<Self, SubmitError> {
        let nav_timeout = Duration::from_secs(config.nav_timeout_secs);
        let mut client = WebDriverClient::new(&config.webdriver_url, nav_timeout)?;
        client.start_session().await?;
        Ok(Self {
            client,
            site_url: config.site_url.trim_end_matches('/').to_string(),
            cookie_name: config.cookie_name.clone(),
            cookie_domain: config.cookie_domain.clone(),
            session_token,
            nav_timeout,
        })
    }

    async fn eval_bool(&self, script: &str, args: Vec<Value>) -> Result<bool, SubmitError> {
        let value = self.client.execute(script, args).await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Polls a boolean script until it returns true or the timeout
    /// elapses.
    async fn wait_for(&self, script: &str, what: &str) -> Result<bool, SubmitError> {
        let deadline = Instant::now() + self.nav_timeout;
        loop {
            if self.eval_bool(script, vec![]).await? {
                return Ok(true);
            }
            if Instant::now() >= deadline {
                debug!("Timed out waiting for {}", what);
                return Ok(false);
            }
            tokio::time::sleep(Duration::from_millis(POLL_INTERVAL_MS)).await;
        }
    }
}

#[async_trait]
impl QuickApplyDriver for QuickApplyFlow {
    async fn check_session(&mut self) -> Result<SessionState, SubmitError> {
        // Cookies can only be set for the domain currently loaded, so
        // hit the site root first, inject, then load a page that
        // requires authentication.
        self.client.goto(&self.site_url).await?;
        self.client
            .add_cookie(
                &self.cookie_name,
                self.session_token.expose_secret(),
                &self.cookie_domain,
            )
            .await?;

        let feed_url = format!("{}/feed/", self.site_url);
        self.client.goto(&feed_url).await?;
        tokio::time::sleep(Duration::from_secs(2)).await;

        let current = self.client.current_url().await?;
        if current.contains("login") || current.contains("authwall") {
            return Ok(SessionState::Expired);
        }
        Ok(SessionState::Valid)
    }

    async fn open_posting(&mut self, url: &str) -> Result<EntryPoint, SubmitError> {
        self.client.goto(url).await?;
        if self.wait_for(FIND_ENTRY_JS, "quick-apply entry control").await? {
            Ok(EntryPoint::QuickApply)
        } else {
            Ok(EntryPoint::External)
        }
    }

    async fn begin_application(&mut self) -> Result<bool, SubmitError> {
        let clicked = self.eval_bool(CLICK_ENTRY_JS, vec![]).await?;
        if !clicked {
            return Err(SubmitError::Interaction(
                "quick-apply control vanished before click".to_string(),
            ));
        }

        let modal_script = format!(
            "return document.querySelector(\"{}\") !== null;",
            MODAL_SELECTOR
        );
        if !self.wait_for(&modal_script, "application dialog").await? {
            return Ok(false);
        }
        tokio::time::sleep(Duration::from_secs(1)).await;

        self.eval_bool(HAS_FORM_CONTENT_JS, vec![]).await
    }

    async fn form_fields(&mut self) -> Result<Vec<FormField>, SubmitError> {
        let value = self.client.execute(SCAN_FIELDS_JS, vec![]).await?;
        let declared = value.as_array().cloned().unwrap_or_default();

        let mut fields = Vec::new();
        for item in declared {
            let handle = item
                .get("handle")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let label = item
                .get("label")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .to_string();
            let kind = match item.get("kind").and_then(|v| v.as_str()) {
                Some("select") => FieldKind::Select,
                Some("textarea") => FieldKind::TextArea,
                Some("checkbox") => FieldKind::Checkbox,
                Some("radio") => FieldKind::Radio,
                _ => FieldKind::Text,
            };
            let options = item
                .get("options")
                .and_then(|v| v.as_array())
                .map(|a| {
                    a.iter()
                        .filter_map(|o| o.as_str().map(|s| s.to_string()))
                        .collect()
                })
                .unwrap_or_default();
            fields.push(FormField {
                handle,
                label,
                kind,
                options,
            });
        }
        Ok(fields)
    }

    async fn fill_field(&mut self, field: &FormField, value: &str) -> Result<(), SubmitError> {
        match field.kind {
            FieldKind::Text | FieldKind::TextArea => {
                let selector = format!("[data-jp-field='{}']", field.handle);
                let element = self
                    .client
                    .find(&selector)
                    .await?
                    .ok_or_else(|| SubmitError::Interaction(format!("field '{}' gone", field.label)))?;
                self.client.clear(&element).await?;
                self.client.send_keys(&element, value).await?;
            }
            FieldKind::Select => {
                self.eval_bool(
                    FILL_SELECT_JS,
                    vec![json!(field.handle), json!(value)],
                )
                .await?;
            }
            FieldKind::Checkbox => {
                self.eval_bool(
                    FILL_CHECKBOX_JS,
                    vec![json!(field.handle), json!(value)],
                )
                .await?;
            }
            FieldKind::Radio => {
                self.eval_bool(FILL_RADIO_JS, vec![json!(field.handle), json!(value)])
                    .await?;
            }
        }
        Ok(())
    }

    async fn upload_resume(&mut self, path: &str) -> Result<bool, SubmitError> {
        let Some(input) = self.client.find("input[type='file']").await? else {
            return Ok(false);
        };
        self.client.send_keys(&input, path).await?;
        tokio::time::sleep(Duration::from_secs(1)).await;
        Ok(true)
    }

    async fn advance(&mut self) -> Result<NavAction, SubmitError> {
        let value = self.client.execute(ADVANCE_JS, vec![]).await?;
        let action = match value.as_str() {
            Some("submit") => NavAction::Submit,
            Some("review") => NavAction::Review,
            Some("next") => NavAction::Next,
            _ => NavAction::Stuck,
        };
        if matches!(action, NavAction::Review | NavAction::Next) {
            tokio::time::sleep(Duration::from_millis(1500)).await;
        }
        Ok(action)
    }

    async fn submit(&mut self) -> Result<(), SubmitError> {
        let clicked = self.eval_bool(SUBMIT_JS, vec![]).await?;
        if !clicked {
            return Err(SubmitError::Interaction(
                "submit control vanished at submission time".to_string(),
            ));
        }
        tokio::time::sleep(Duration::from_millis(2500)).await;
        Ok(())
    }

    async fn confirm(&mut self) -> Result<bool, SubmitError> {
        let confirmed = self.wait_for(CONFIRM_JS, "submission confirmation").await?;
        // Dismiss the confirmation dialog either way.
        let _ = self.eval_bool(CLOSE_MODAL_JS, vec![]).await;
        Ok(confirmed)
    }

    async fn abandon(&mut self) {
        let _ = self.eval_bool(CLOSE_MODAL_JS, vec![]).await;
    }

    async fn close(&mut self) {
        self.client.end_session().await;
    }
}
