use std::{fs, path::Path};

use rustyline::DefaultEditor;

/// True when `path` is a regular file with at least one byte in it.
pub fn is_non_empty_file<P: AsRef<Path>>(path: P) -> bool {
    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.len() > 0)
        .unwrap_or(false)
}

/// Ask for an optional value. A blank answer means "leave it out".
pub fn prompt_field(
    rl: &mut DefaultEditor,
    question: &str,
) -> anyhow::Result<Option<String>> {
    let answer = rl.readline(question)?;
    let answer = answer.trim();
    if answer.is_empty() {
        Ok(None)
    } else {
        Ok(Some(answer.to_owned()))
    }
}
