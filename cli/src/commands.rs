//! CLI Commands

use ballotbox_core::{Timestamp, VoterId};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// API Client for interacting with a BALLOTBOX node
pub struct ApiClient {
    base_url: String,
    client: Client,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: Client::builder().timeout(Duration::from_secs(30)).build()?,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Get node status
    pub async fn status(&self) -> Result<NodeStatus, ApiError> {
        self.get("/status").await
    }

    /// List all proposals
    pub async fn list_proposals(&self) -> Result<Vec<ProposalInfo>, ApiError> {
        self.get("/proposals").await
    }

    /// Get one proposal
    pub async fn get_proposal(&self, id: u64) -> Result<ProposalInfo, ApiError> {
        self.get(&format!("/proposals/{}", id)).await
    }

    /// Create a proposal
    pub async fn create_proposal(&self, req: &CreateProposalRequest) -> Result<CreatedProposal, ApiError> {
        self.post("/proposals", req).await
    }

    /// Cast a vote
    pub async fn vote(&self, id: u64, req: &VoteRequest) -> Result<TallyInfo, ApiError> {
        self.post(&format!("/proposals/{}/votes", id), req).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp: ApiResponse<T> = self.client.get(&url).send().await?.json().await?;
        resp.into_result()
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp: ApiResponse<T> = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await?
            .json()
            .await?;
        resp.into_result()
    }
}

/// API response wrapper
#[derive(Deserialize)]
struct ApiResponse<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<T> ApiResponse<T> {
    fn into_result(self) -> Result<T, ApiError> {
        if self.success {
            self.data.ok_or(ApiError::EmptyResponse)
        } else {
            Err(ApiError::Server(self.error.unwrap_or_default()))
        }
    }
}

/// Node status
#[derive(Debug, Deserialize)]
pub struct NodeStatus {
    pub name: String,
    pub proposal_count: usize,
    pub next_proposal_id: u64,
    pub owner: Option<String>,
    pub max_votes: u32,
    pub now: u64,
    pub started_at: u64,
}

/// Proposal info
#[derive(Debug, Deserialize)]
pub struct ProposalInfo {
    pub id: u64,
    pub creator: String,
    pub deadline: u64,
    pub created_at: u64,
    pub max_votes: u32,
    pub yes_count: u64,
    pub no_count: u64,
    pub status: String,
}

/// Proposal creation request
#[derive(Debug, Serialize)]
pub struct CreateProposalRequest {
    pub caller: String,
    pub deadline: u64,
}

/// Proposal creation response
#[derive(Debug, Deserialize)]
pub struct CreatedProposal {
    pub id: u64,
}

/// Vote request
#[derive(Debug, Serialize)]
pub struct VoteRequest {
    pub voter: String,
    pub choice: bool,
}

/// Tally after a vote
#[derive(Debug, Deserialize)]
pub struct TallyInfo {
    pub proposal_id: u64,
    pub yes_count: u64,
    pub no_count: u64,
}

/// API Error
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server error: {0}")]
    Server(String),

    #[error("Empty response")]
    EmptyResponse,

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Build a creation request. Exactly one of `deadline_ms` and `in_secs`
/// must be given; `in_secs` counts from `now`.
pub fn build_create_request(
    caller: &str,
    deadline_ms: Option<u64>,
    in_secs: Option<u64>,
    now: Timestamp,
) -> Result<CreateProposalRequest, ApiError> {
    let caller = parse_voter(caller)?;

    let deadline = match (deadline_ms, in_secs) {
        (Some(ms), None) => Timestamp::from_millis(ms),
        (None, Some(secs)) => now.saturating_add_secs(secs),
        _ => {
            return Err(ApiError::InvalidInput(
                "give exactly one of --deadline or --in-secs".into(),
            ))
        }
    };

    Ok(CreateProposalRequest {
        caller: caller.to_hex(),
        deadline: deadline.as_millis(),
    })
}

/// Build a vote request
pub fn build_vote_request(voter: &str, choice: bool) -> Result<VoteRequest, ApiError> {
    Ok(VoteRequest {
        voter: parse_voter(voter)?.to_hex(),
        choice,
    })
}

fn parse_voter(hex: &str) -> Result<VoterId, ApiError> {
    VoterId::from_hex(hex).map_err(|e| ApiError::InvalidInput(format!("voter id: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_relative_deadline() {
        let caller = VoterId([1u8; 32]).to_hex();
        let req = build_create_request(&caller, None, Some(60), Timestamp::from_secs(100)).unwrap();
        assert_eq!(req.deadline, 160_000);
        assert_eq!(req.caller, caller);
    }

    #[test]
    fn test_create_request_needs_one_deadline() {
        let caller = VoterId([1u8; 32]).to_hex();
        let now = Timestamp::from_secs(100);
        assert!(build_create_request(&caller, None, None, now).is_err());
        assert!(build_create_request(&caller, Some(1), Some(1), now).is_err());
    }

    #[test]
    fn test_vote_request_normalizes_voter() {
        let hex = VoterId([0xab; 32]).to_hex();
        let req = build_vote_request(&format!("0x{}", hex), true).unwrap();
        assert_eq!(req.voter, hex);
        assert!(matches!(build_vote_request("0x12", true), Err(ApiError::InvalidInput(_))));
    }

    #[test]
    fn test_envelope_errors() {
        let resp: ApiResponse<CreatedProposal> =
            serde_json::from_str(r#"{"success": false, "data": null, "error": "Duplicate vote"}"#).unwrap();
        assert!(matches!(resp.into_result(), Err(ApiError::Server(msg)) if msg == "Duplicate vote"));

        let resp: ApiResponse<CreatedProposal> =
            serde_json::from_str(r#"{"success": true, "data": null, "error": null}"#).unwrap();
        assert!(matches!(resp.into_result(), Err(ApiError::EmptyResponse)));
    }
}
