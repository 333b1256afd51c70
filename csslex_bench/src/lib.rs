//! Input generation for the tokenizer benchmarks.

const RULE_TEMPLATES: &[&str] = &[
    "@media screen and (min-width: 10.5em) {\n  .nav-{i} a:hover { color: #f0f !important; }\n}\n",
    "/* rule {i} */\n#id-{i} > li + li { margin: -1.5px +2px .5em 0; width: calc(100% - {i}px); }\n",
    "a[href^='http'], a[title~=\"x{i}\"] { content: \"\\201C quoted \\\"{i}\\\"\"; }\n",
    ".bg-{i} { background: url( \"img/bg-{i}.png\" ) no-repeat, URL(img/a\\ b.png); }\n",
    "@font-face { font-family: f{i}; unicode-range: U+0025-00FF, u+4??; src: url(f{i}.woff); }\n",
    "<!-- .\\31 0-cols-{i} { grid-template-columns: repeat({i}, 1fr); } -->\n",
];

/// A stylesheet of `rules` rules cycling through a fixed set of templates.
pub fn sample_stylesheet(rules: usize) -> String {
    let mut css = String::new();
    for i in 0..rules {
        let template = RULE_TEMPLATES[i % RULE_TEMPLATES.len()];
        css.push_str(&template.replace("{i}", &i.to_string()));
    }
    css
}

/// Splits `text` into pieces of about `size` bytes on character boundaries.
pub fn chunks(text: &str, size: usize) -> Vec<&str> {
    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        let mut end = size.max(1).min(rest.len());
        while !rest.is_char_boundary(end) {
            end += 1;
        }
        let (chunk, tail) = rest.split_at(end);
        chunks.push(chunk);
        rest = tail;
    }
    chunks
}
