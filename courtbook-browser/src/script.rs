//! JavaScript snippets evaluated in the booking page.
//!
//! Every string from configuration is embedded through `serde_json`, which
//! yields a valid JS string literal whatever quotes it contains.

use serde_json::Value;

/// Attribute stamped on enumerated elements so later clicks can find them.
pub const REF_ATTR: &str = "data-courtbook-ref";

fn lit(s: &str) -> String {
    Value::String(s.to_string()).to_string()
}

/// Snapshot every element produced by `query` (a JS array expression),
/// stamping each with `<generation>-<index>`.
fn snapshot(query: &str, generation: u64) -> String {
    format!(
        r#"(() => {{
  const els = {query};
  return els.map((el, i) => {{
    const ref = "{generation}-" + i;
    el.setAttribute({attr}, ref);
    const r = el.getBoundingClientRect();
    const style = window.getComputedStyle(el);
    return {{
      ref,
      date: el.getAttribute("data-date"),
      text: (el.innerText || el.textContent || "").trim(),
      label: el.getAttribute("aria-label") || "",
      disabled: !!el.disabled || el.getAttribute("aria-disabled") === "true",
      visible: r.width > 0 && r.height > 0 && style.visibility !== "hidden" && style.display !== "none",
    }};
  }});
}})()"#,
        attr = lit(REF_ATTR),
    )
}

pub fn select_all(selector: &str, generation: u64) -> String {
    snapshot(
        &format!("Array.from(document.querySelectorAll({}))", lit(selector)),
        generation,
    )
}

/// Buttons whose visible text contains `label`.
pub fn buttons_labelled(label: &str, generation: u64) -> String {
    snapshot(
        &format!(
            r#"Array.from(document.querySelectorAll('button, [role="button"]')).filter(el => (el.innerText || el.textContent || "").includes({}))"#,
            lit(label)
        ),
        generation,
    )
}

/// Scroll a stamped element into view and click it; `false` if it is gone.
pub fn click_ref(reference: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.querySelector("[" + {attr} + "=" + JSON.stringify({r}) + "]");
  if (!el) return false;
  el.scrollIntoView({{block: "center"}});
  el.click();
  return true;
}})()"#,
        attr = lit(REF_ATTR),
        r = lit(reference),
    )
}

// getElementById: several form ids start with a digit, which CSS `#id` rejects.

pub fn field_exists(id: &str) -> String {
    format!("document.getElementById({}) !== null", lit(id))
}

/// Focus a field and select its contents so inserted text replaces them.
pub fn focus_field(id: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.getElementById({});
  if (!el) return false;
  el.scrollIntoView({{block: "center"}});
  el.focus();
  if (typeof el.select === "function") el.select();
  return true;
}})()"#,
        lit(id)
    )
}

/// Fire `change` and blur once typing is done.
pub fn commit_field(id: &str) -> String {
    format!(
        r#"(() => {{
  const el = document.getElementById({});
  if (!el) return false;
  el.dispatchEvent(new Event("change", {{bubbles: true}}));
  el.blur();
  return true;
}})()"#,
        lit(id)
    )
}

pub fn body_contains(text: &str) -> String {
    format!(
        r#"((document.body && document.body.innerText) || "").includes({})"#,
        lit(text)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selectors_are_embedded_as_string_literals() {
        let js = select_all(r#"button[data-container="time-button"]"#, 3);
        assert!(js.contains(r#"querySelectorAll("button[data-container=\"time-button\"]")"#), "{js}");
        assert!(js.contains(r#"const ref = "3-" + i;"#));
    }

    #[test]
    fn labels_with_quotes_stay_inside_the_literal() {
        let js = buttons_labelled(r#"Say "hi""#, 1);
        assert!(js.contains(r#".includes("Say \"hi\"")"#), "{js}");
    }

    #[test]
    fn digit_leading_ids_use_get_element_by_id() {
        assert_eq!(
            field_exists("1bT3Iu2abRAKqjda6jqLu"),
            r#"document.getElementById("1bT3Iu2abRAKqjda6jqLu") !== null"#
        );
    }

    #[test]
    fn click_targets_the_stamped_attribute() {
        let js = click_ref("4-2");
        assert!(js.contains(r#""data-courtbook-ref""#));
        assert!(js.contains(r#"JSON.stringify("4-2")"#));
    }
}
