use std::borrow::Cow;
use std::sync::LazyLock;

use regex::Regex;

// `$15`, `$ 15`, `$1,200.50`; a trailing comma is not part of the amount.
static AMOUNT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\s?(\d(?:[\d,]*\d)?(?:\.\d+)?)").expect("invalid amount regex")
});
static VARIABLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$([A-Za-z]\w*)").expect("invalid variable regex"));
static BARE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\$+").expect("invalid dollar regex"));

/// Spells out literal dollar signs.
///
/// `$15` becomes `15 dollars`, `$1,200.50` becomes `1,200.50 dollars`, `$N`
/// becomes `N dollars` and any remaining `$` becomes `dollars`. Must only be
/// applied to text whose formulas are already protected.
pub fn clean_dollars(text: &str) -> Cow<'_, str> {
    if !text.contains('$') {
        return Cow::Borrowed(text);
    }

    let text = AMOUNT.replace_all(text, "${1} dollars");
    let text = VARIABLE.replace_all(&text, "${1} dollars").into_owned();
    let text = BARE.replace_all(&text, "dollars").into_owned();
    Cow::Owned(text)
}
