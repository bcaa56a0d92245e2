//! Generation and repair instruction templates
//!
//! Templates use `{placeholder}` substitution. `{sections}` expands to the
//! quality gate's required markers so the instructions and the gate agree.

pub const GENERATION_SYSTEM: &str = "You are a senior technical writer specialised in applied AI for \
programmers. You write clear, practical and professional prose for developers. \
You never invent links, sources or data, and you add no filler.";

pub const GENERATION_USER: &str = r#"CONTEXT (relevant section of the outline):
"""{context}"""

METADATA:
- Category: {category}
- Title: "{title}"

TASK:
Write one article in Markdown. Target length: 900-1400 words.

OUTPUT FORMAT (strict):
1) First line: # {title}
2) Second line: **Meta:** <meta description, 140-160 characters>
3) Then the body.

Minimum structure:
- Introduction (why it matters)
- Main explanation with examples (one short code block if it helps)
- Common pitfalls (at least 3)
- Actionable checklist (5-10 items)
- Next steps (2-4 bullets)

The article must contain these markers: {sections}.

RULES:
- No YAML front matter.
- No invented links.
- No preambles such as "Here is...".
- Return ONLY Markdown.
"#;

pub const REPAIR_SYSTEM: &str = "You are a senior technical editor. You improve Markdown articles. \
You never invent links or pad with filler. You keep the article coherent and expand it when needed.";

pub const REPAIR_USER: &str = r#"The following article failed the quality check: {reason}

GOAL (strict):
- Keep the same topic and the same title: # {title}
- Make sure the article has 900-1400 words (expand with useful content if it is short).
- It must contain these markers: {sections}.
- Add concrete examples and deeper explanation (no invented sources or links).
- Return ONLY Markdown.

CURRENT ARTICLE:
"""{content}"""
"#;

/// A system and user prompt pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

fn sections_list(required_sections: &[String]) -> String {
    required_sections.join(", ")
}

/// Prompt for the first generation of a leaf item.
pub fn generation_prompt(context: &str, category: &str, title: &str, required_sections: &[String]) -> Prompt {
    let user = GENERATION_USER
        .replace("{context}", context)
        .replace("{category}", category)
        .replace("{title}", title)
        .replace("{sections}", &sections_list(required_sections));
    Prompt {
        system: GENERATION_SYSTEM.to_string(),
        user,
    }
}

/// Prompt for the single repair of a rejected attempt.
pub fn repair_prompt(content: &str, title: &str, reason: &str, required_sections: &[String]) -> Prompt {
    // Content goes in last so markers inside the article are never expanded.
    let user = REPAIR_USER
        .replace("{reason}", reason)
        .replace("{title}", title)
        .replace("{sections}", &sections_list(required_sections))
        .replace("{content}", content);
    Prompt {
        system: REPAIR_SYSTEM.to_string(),
        user,
    }
}
