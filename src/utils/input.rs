use std::io::{self, BufRead, Write};

/// Prompts once and returns the trimmed line, or `default` when the line
/// is empty. `None` on end of input.
pub fn get_line(prompt: &str, default: Option<&str>) -> io::Result<Option<String>> {
    let stdin = io::stdin();
    prompt_line(&mut stdin.lock(), &mut io::stdout(), prompt, default)
}

pub fn prompt_line<R: BufRead, W: Write>(
    reader: &mut R,
    writer: &mut W,
    prompt: &str,
    default: Option<&str>,
) -> io::Result<Option<String>> {
    match default {
        Some(d) => write!(writer, "{} [{}]: ", prompt, d)?,
        None => write!(writer, "{}: ", prompt)?,
    }
    writer.flush()?;

    let mut input = String::new();
    if reader.read_line(&mut input)? == 0 {
        return Ok(None);
    }
    let line = input.trim();
    Ok(Some(match (line.is_empty(), default) {
        (true, Some(d)) => d.to_string(),
        _ => line.to_string(),
    }))
}
