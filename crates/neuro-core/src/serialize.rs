// ─────────────────────────────────────────────────────────────────────
// SCPN Neuro Control — Network Text Format
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Plain-text network files.
//!
//! ```text
//! inputs_count= 2
//! layer_count= 2
//! purelin_output= True
//! weights0
//! 0.5 -1
//! 0.25 0.75
//!
//! weights1
//! 1 -0.5
//!
//! biases0
//! 0.1
//! -0.2
//!
//! biases1
//! 0.3
//!
//! ```
//!
//! Values use Rust's shortest round-trip float formatting, so a saved network
//! reloads bit-exactly.

use crate::network::{Layer, TansigNetwork};
use ndarray::{Array1, Array2};
use neuro_types::error::{NeuroError, NeuroResult};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

pub fn write_network<W: Write>(net: &TansigNetwork, mut w: W) -> NeuroResult<()> {
    writeln!(w, "inputs_count= {}", net.input_count())?;
    writeln!(w, "layer_count= {}", net.layer_count())?;
    let purelin = if net.is_purelin_output() { "True" } else { "False" };
    writeln!(w, "purelin_output= {purelin}")?;

    for (i, layer) in net.layers().iter().enumerate() {
        writeln!(w, "weights{i}")?;
        for row in layer.weights.outer_iter() {
            let cells: Vec<String> = row.iter().map(|v| format!("{v}")).collect();
            writeln!(w, "{}", cells.join(" "))?;
        }
        writeln!(w)?;
    }
    for (i, layer) in net.layers().iter().enumerate() {
        writeln!(w, "biases{i}")?;
        for b in layer.biases.iter() {
            writeln!(w, "{b}")?;
        }
        writeln!(w)?;
    }
    w.flush()?;
    Ok(())
}

pub fn save_network<P: AsRef<Path>>(net: &TansigNetwork, path: P) -> NeuroResult<()> {
    let file = File::create(path)?;
    write_network(net, BufWriter::new(file))
}

pub fn load_network<P: AsRef<Path>>(path: P) -> NeuroResult<TansigNetwork> {
    let file = File::open(path)?;
    read_network(BufReader::new(file))
}

/// Line cursor with 1-based numbering for error messages.
struct LineCursor {
    lines: Vec<String>,
    pos: usize,
}

impl LineCursor {
    fn format_err(&self, message: impl Into<String>) -> NeuroError {
        NeuroError::Format {
            line: self.pos.min(self.lines.len()).max(1),
            message: message.into(),
        }
    }

    fn next_line(&mut self) -> Option<&str> {
        let line = self.lines.get(self.pos)?;
        self.pos += 1;
        Some(line.trim())
    }

    fn skip_blank(&mut self) {
        while self
            .lines
            .get(self.pos)
            .is_some_and(|l| l.trim().is_empty())
        {
            self.pos += 1;
        }
    }

    fn header_value(&mut self, key: &str) -> NeuroResult<String> {
        self.skip_blank();
        let eof = self.lines.len() + 1;
        let line = self
            .next_line()
            .ok_or_else(|| NeuroError::Format {
                line: eof,
                message: format!("file ends before `{key}=`"),
            })?
            .to_string();
        match line.strip_prefix(key).and_then(|rest| rest.strip_prefix('=')) {
            Some(value) => Ok(value.trim().to_string()),
            None => Err(self.format_err(format!("expected `{key}=`, found `{line}`"))),
        }
    }

    fn header_usize(&mut self, key: &str) -> NeuroResult<usize> {
        let value = self.header_value(key)?;
        value
            .parse()
            .map_err(|_| self.format_err(format!("`{key}` must be a non-negative integer, got `{value}`")))
    }

    fn expect_tag(&mut self, tag: &str) -> NeuroResult<()> {
        self.skip_blank();
        let eof = self.lines.len() + 1;
        let found = match self.next_line() {
            Some(line) if line == tag => return Ok(()),
            Some(line) => line.to_string(),
            None => {
                return Err(NeuroError::Format {
                    line: eof,
                    message: format!("file ends before `{tag}`"),
                })
            }
        };
        Err(self.format_err(format!("expected `{tag}`, found `{found}`")))
    }

    /// Numeric rows up to the next blank line.
    fn block(&mut self, tag: &str) -> NeuroResult<Vec<Vec<f64>>> {
        let eof = self.lines.len() + 1;
        let mut rows = Vec::new();
        loop {
            let Some(line) = self.next_line() else {
                return Err(NeuroError::Format {
                    line: eof,
                    message: format!("block `{tag}` is not terminated by a blank line"),
                });
            };
            if line.is_empty() {
                return Ok(rows);
            }
            let parsed: Result<Vec<f64>, _> = line.split_whitespace().map(str::parse::<f64>).collect();
            match parsed {
                Ok(row) => rows.push(row),
                Err(_) => {
                    let found = line.to_string();
                    return Err(self.format_err(format!("non-numeric value in `{tag}`: `{found}`")));
                }
            }
        }
    }
}

pub fn read_network<R: BufRead>(reader: R) -> NeuroResult<TansigNetwork> {
    let lines = reader.lines().collect::<Result<Vec<String>, _>>()?;
    let mut cur = LineCursor { lines, pos: 0 };

    let inputs = cur.header_usize("inputs_count")?;
    let layer_count = cur.header_usize("layer_count")?;
    let purelin_raw = cur.header_value("purelin_output")?;
    let purelin_output = match purelin_raw.to_ascii_lowercase().as_str() {
        "true" => true,
        "false" => false,
        _ => {
            return Err(cur.format_err(format!(
                "`purelin_output` must be True or False, got `{purelin_raw}`"
            )))
        }
    };
    if inputs == 0 || layer_count == 0 {
        return Err(cur.format_err("network needs at least one input and one layer"));
    }

    let mut weights = Vec::with_capacity(layer_count);
    let mut fan_in = inputs;
    for i in 0..layer_count {
        let tag = format!("weights{i}");
        cur.expect_tag(&tag)?;
        let rows = cur.block(&tag)?;
        if rows.is_empty() {
            return Err(cur.format_err(format!("`{tag}` has no rows")));
        }
        if let Some(bad) = rows.iter().find(|r| r.len() != fan_in) {
            return Err(cur.format_err(format!(
                "`{tag}` rows must have {fan_in} values, found a row with {}",
                bad.len()
            )));
        }
        let neurons = rows.len();
        let flat: Vec<f64> = rows.into_iter().flatten().collect();
        let matrix = Array2::from_shape_vec((neurons, fan_in), flat)
            .map_err(|e| cur.format_err(format!("`{tag}`: {e}")))?;
        weights.push(matrix);
        fan_in = neurons;
    }

    let mut layers = Vec::with_capacity(layer_count);
    for (i, w) in weights.into_iter().enumerate() {
        let tag = format!("biases{i}");
        cur.expect_tag(&tag)?;
        let rows = cur.block(&tag)?;
        if rows.len() != w.nrows() || rows.iter().any(|r| r.len() != 1) {
            return Err(cur.format_err(format!(
                "`{tag}` must hold {} single values, one per row",
                w.nrows()
            )));
        }
        let biases: Array1<f64> = rows.into_iter().map(|r| r[0]).collect();
        layers.push(Layer { weights: w, biases });
    }

    TansigNetwork::from_layers(inputs, layers, purelin_output).map_err(|e| cur.format_err(e.to_string()))
}
