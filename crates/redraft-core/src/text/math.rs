use std::sync::LazyLock;

use regex::Regex;

// Inline `$…$` must hug its content and stay on one line. A closing `$`
// followed by a digit opens a price, so such a match is left alone.
static MATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?s)\$\$.+?\$\$",
        r"|\\\[.+?\\\]",
        r"|\\\(.+?\\\)",
        r"|\\begin\{[a-zA-Z*]+\}.+?\\end\{[a-zA-Z*]+\}",
        r"|\$[^\s$](?:[^$\n]*?[^\s$])?\$(?P<price>\d)?",
    ))
    .expect("invalid math regex")
});

/// Text with its LaTeX regions replaced by `[[MATH_n]]` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtectedText {
    text: String,
    formulas: Vec<String>,
}

/// Replaces `$$…$$`, `$…$`, `\[…\]`, `\(…\)` and `\begin{env}…\end{env}`
/// regions with numbered placeholders.
///
/// Inline `$…$` only counts when no space follows the opening `$` or precedes
/// the closing one, so `$5 and $10` stays plain text.
pub fn protect_math(text: &str) -> ProtectedText {
    let mut formulas = Vec::new();
    let protected = MATH.replace_all(text, |caps: &regex::Captures<'_>| {
        if caps.name("price").is_some() {
            return caps[0].to_owned();
        }
        let placeholder = placeholder(formulas.len());
        formulas.push(caps[0].to_owned());
        placeholder
    });

    ProtectedText {
        text: protected.into_owned(),
        formulas,
    }
}

fn placeholder(index: usize) -> String {
    format!("[[MATH_{index}]]")
}

impl ProtectedText {
    /// Returns the text with placeholders in place of formulas.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the number of protected formulas.
    pub fn len(&self) -> usize {
        self.formulas.len()
    }

    /// Returns true if no formula was found.
    pub fn is_empty(&self) -> bool {
        self.formulas.is_empty()
    }

    /// Puts the formulas back into `output`.
    ///
    /// Placeholders the model dropped are appended after the text, each in its
    /// own paragraph, so no formula is lost.
    pub fn restore(&self, output: &str) -> String {
        let mut restored = output.to_owned();
        let mut missing = Vec::new();

        for (index, formula) in self.formulas.iter().enumerate() {
            let placeholder = placeholder(index);
            if restored.contains(&placeholder) {
                restored = restored.replace(&placeholder, formula);
            } else {
                missing.push(formula.as_str());
            }
        }

        for formula in missing {
            restored.push_str("\n\n");
            restored.push_str(formula);
        }

        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_delimiters_are_protected() {
        let source = r"Energy $$E = mc^2$$ and \(a+b\) then \[x^2\] plus
\begin{align}y &= 1\\ z &= 2\end{align} done";
        let protected = protect_math(source);

        assert_eq!(protected.len(), 4);
        assert_eq!(
            protected.text(),
            "Energy [[MATH_0]] and [[MATH_1]] then [[MATH_2]] plus\n[[MATH_3]] done"
        );
        assert_eq!(protected.restore(protected.text()), source);
    }

    #[test]
    fn plain_text_is_unchanged() {
        let protected = protect_math("Nothing to see, it costs $5.");
        assert!(protected.is_empty());
        assert_eq!(protected.text(), "Nothing to see, it costs $5.");
    }

    #[test]
    fn inline_dollar_math_is_protected() {
        let source = "Let $x^2 + y$ be positive and $n$ odd, unlike $$z$$.";
        let protected = protect_math(source);

        assert_eq!(protected.len(), 3);
        assert_eq!(
            protected.text(),
            "Let [[MATH_0]] be positive and [[MATH_1]] odd, unlike [[MATH_2]]."
        );
        assert_eq!(protected.restore(protected.text()), source);
    }

    #[test]
    fn prices_are_not_inline_math() {
        for source in [
            "Tickets cost $5 and $10.",
            "Pick $5 or $ 10 at the door.",
            "Prices went from $5/$10 to more.",
            "Two lines $a\nand b$ here.",
        ] {
            let protected = protect_math(source);
            assert!(protected.is_empty(), "{source}");
            assert_eq!(protected.text(), source);
        }
    }

    #[test]
    fn dropped_placeholders_are_appended() {
        let protected = protect_math(r"Start \(x\) middle \(y\) end");
        let restored = protected.restore("Rewritten [[MATH_1]] only");
        assert_eq!(restored, "Rewritten \\(y\\) only\n\n\\(x\\)");
    }

    #[test]
    fn reordered_placeholders_follow_the_output() {
        let protected = protect_math(r"$$a$$ then $$b$$");
        let restored = protected.restore("[[MATH_1]] before [[MATH_0]]");
        assert_eq!(restored, "$$b$$ before $$a$$");
    }
}
