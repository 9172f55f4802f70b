// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! System resource vector and its parser

use super::connection::Sentence;
use crate::error::RouterOsError;

/// Point-in-time `/system/resource` values from a device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemResource {
    pub uptime: String,
    pub cpu_load: u64,
    pub free_memory: u64,
    pub total_memory: u64,
    pub free_hdd_space: u64,
    pub total_hdd_space: u64,
    pub version: String,
    pub board_name: String,
}

fn numeric(sentence: &Sentence, key: &str) -> Result<u64, RouterOsError> {
    match sentence.get(key) {
        None => Ok(0),
        Some(v) => v.trim().parse().map_err(|_| {
            RouterOsError::Protocol(format!("field '{key}' is not numeric: '{v}'"))
        }),
    }
}

/// Parses the first resource sentence
///
/// Missing numeric fields read as 0; present but non-numeric ones are an error,
/// as is an empty reply.
pub(crate) fn parse_system(sentences: &[Sentence]) -> Result<SystemResource, RouterOsError> {
    let first = sentences
        .first()
        .ok_or_else(|| RouterOsError::Protocol("empty /system/resource reply".to_string()))?;
    Ok(SystemResource {
        uptime: first
            .get("uptime")
            .cloned()
            .unwrap_or_else(|| "0s".to_string()),
        cpu_load: numeric(first, "cpu-load")?,
        free_memory: numeric(first, "free-memory")?,
        total_memory: numeric(first, "total-memory")?,
        free_hdd_space: numeric(first, "free-hdd-space")?,
        total_hdd_space: numeric(first, "total-hdd-space")?,
        version: first
            .get("version")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
        board_name: first
            .get("board-name")
            .cloned()
            .unwrap_or_else(|| "unknown".to_string()),
    })
}
