// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! RouterOS authentication

use md5::compute as md5_compute;
use tokio::io::{AsyncRead, AsyncWrite};

use super::RouterOsConnection;
use crate::error::RouterOsError;

impl<S> RouterOsConnection<S>
where
    S: AsyncRead + AsyncWrite + Unpin + Send,
{
    pub(crate) async fn login(&mut self, username: &str, password: &str) -> Result<(), RouterOsError> {
        tracing::trace!("Attempting login for user: {}", username);
        // Try new login method first (RouterOS 6.43+)
        let login_result = self
            .raw_command(vec![
                "/login".to_string(),
                format!("=name={username}"),
                format!("=password={password}"),
            ])
            .await;

        let challenge_hex = match login_result {
            Ok(sentences) => {
                tracing::trace!(
                    "New login method response received, {} sentences",
                    sentences.len()
                );
                // Pre-6.43 routers ignore the credentials and answer with a challenge
                let challenge = sentences.iter().find_map(|s| s.get("ret").cloned());
                match challenge {
                    Some(ret) => ret,
                    None => {
                        for s in &sentences {
                            if let Some(msg) = s.get("message") {
                                if msg.contains("failure") || msg.contains("invalid") {
                                    tracing::trace!("Login failed with message: {}", msg);
                                    return Err(RouterOsError::Login(msg.clone()));
                                }
                                tracing::debug!("Login message: {}", msg);
                            }
                        }
                        tracing::debug!("Login successful (new method)");
                        return Ok(());
                    }
                }
            }
            Err(RouterOsError::Trap(msg)) => {
                tracing::trace!("Login rejected: {}", msg);
                return Err(RouterOsError::Login(msg));
            }
            Err(e) => return Err(e),
        };

        // Legacy challenge-response method (pre-6.43)
        tracing::trace!("Challenge received, length: {}", challenge_hex.len());
        let challenge = hex::decode(&challenge_hex)
            .map_err(|e| RouterOsError::Protocol(format!("invalid login challenge: {e}")))?;

        // Build MD5 hash of 0 + password + challenge
        let mut data = Vec::with_capacity(1 + password.len() + challenge.len());
        data.push(0u8);
        data.extend_from_slice(password.as_bytes());
        data.extend_from_slice(&challenge);
        let digest = md5_compute(&data);
        let mut response = String::from("00");
        response.push_str(&hex::encode(digest.0));

        match self
            .raw_command(vec![
                "/login".to_string(),
                format!("=name={username}"),
                format!("=response={response}"),
            ])
            .await
        {
            Ok(_) => {
                tracing::debug!("Login successful (legacy method)");
                Ok(())
            }
            Err(RouterOsError::Trap(msg)) => Err(RouterOsError::Login(msg)),
            Err(e) => Err(e),
        }
    }
}
