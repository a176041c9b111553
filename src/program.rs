use std::fs;
use std::path::Path;

use crate::decoder::decode_all;
use crate::error::{Error, Result};
use crate::instruction::Instruction;

/// Decodes program text, one encoding per line. Blank lines are skipped;
/// every other line goes to the decoder as-is. The first bad line aborts
/// the whole load.
pub fn parse(text: &str) -> Result<Vec<Instruction>> {
    let lines = text
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line))
        .filter(|(_, line)| !line.trim().is_empty());
    let instructions = decode_all(lines).map_err(|(line, source)| Error::Load { line, source })?;
    log::debug!("loaded {} instructions", instructions.len());
    Ok(instructions)
}

pub fn from_file<P: AsRef<Path>>(file_path: P) -> Result<Vec<Instruction>> {
    let file_text = fs::read_to_string(file_path)?;
    parse(&file_text)
}
