use std::ops::RangeInclusive;
use unicode_normalization::UnicodeNormalization;
use crate::models::{Member, NewTeam, RegisterTeamRequest};

pub const MAX_TEAM_NAME_LENGTH: usize = 100;
pub const MAX_FIELD_LENGTH: usize = 200;
pub const TEAM_SIZE: usize = 3;
pub const REPO_SUFFIX: &str = "-meme-war";
const COMBINING_MARKS: RangeInclusive<char> = '\u{0300}'..='\u{036F}';
pub const DEFAULT_DURATION_MINUTES: f64 = 60.0;
pub const MAX_DURATION_MINUTES: f64 = 7.0 * 24.0 * 60.0;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Missing required fields.")]
    MissingFields,
    #[error("Exactly {TEAM_SIZE} members are required.")]
    WrongMemberCount,
    #[error("Team name exceeds maximum length of {MAX_TEAM_NAME_LENGTH}")]
    TeamNameTooLong,
    #[error("Field exceeds maximum length of {MAX_FIELD_LENGTH}")]
    FieldTooLong,
    #[error("Team name must contain at least one letter or digit")]
    UnusableTeamName,
    #[error("teamId required")]
    MissingTeamId,
    #[error("durationMinutes must be between 0 and {MAX_DURATION_MINUTES}")]
    InvalidDuration,
}

fn required(field: &Option<String>) -> Result<&str, ValidationError> {
    match field.as_deref().map(str::trim) {
        Some(value) if !value.is_empty() => {
            if value.len() > MAX_FIELD_LENGTH {
                Err(ValidationError::FieldTooLong)
            } else {
                Ok(value)
            }
        }
        _ => Err(ValidationError::MissingFields),
    }
}

/// Lowercase ASCII slug. Accents are dropped after NFKD decomposition, then
/// alphanumerics are kept and every other run is collapsed to `-`.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for ch in input.nfkd().filter(|c| !COMBINING_MARKS.contains(c)) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}

pub fn repo_name_for(team_name: &str) -> String {
    format!("{}{}", slugify(team_name), REPO_SUFFIX)
}

pub fn repo_url_for(github_username: &str, repo_name: &str) -> String {
    format!("https://github.com/{}/{}", github_username, repo_name)
}

pub fn pages_url_for(github_username: &str, repo_name: &str) -> String {
    format!("https://{}.github.io/{}/", github_username, repo_name)
}

pub fn validate_registration(request: &RegisterTeamRequest) -> Result<NewTeam, ValidationError> {
    let name = required(&request.team_name)?;
    let department = required(&request.department)?;
    let faculty = required(&request.faculty)?;
    let github_username = required(&request.github_username)?;

    let members = match &request.members {
        Some(members) if members.len() == TEAM_SIZE => members,
        _ => return Err(ValidationError::WrongMemberCount),
    };

    if name.chars().count() > MAX_TEAM_NAME_LENGTH {
        return Err(ValidationError::TeamNameTooLong);
    }
    if slugify(name).is_empty() {
        return Err(ValidationError::UnusableTeamName);
    }

    let members = members
        .iter()
        .enumerate()
        .map(|(idx, member)| {
            let member = member.clone().unwrap_or_default();
            Member {
                name: member.name.unwrap_or_default().trim().to_string(),
                email: member.email.unwrap_or_default().trim().to_string(),
                is_leader: idx == 0,
            }
        })
        .collect();

    let repo_name = repo_name_for(name);
    let repo_url = repo_url_for(github_username, &repo_name);

    Ok(NewTeam {
        name: name.to_string(),
        department: department.to_string(),
        faculty: faculty.to_string(),
        github_username: github_username.to_string(),
        members,
        repo_name,
        repo_url,
    })
}

pub fn validate_team_id(team_id: Option<&str>) -> Result<&str, ValidationError> {
    match team_id.map(str::trim) {
        Some(id) if !id.is_empty() => Ok(id),
        _ => Err(ValidationError::MissingTeamId),
    }
}

pub fn validate_duration_minutes(minutes: Option<f64>) -> Result<f64, ValidationError> {
    let minutes = minutes.unwrap_or(DEFAULT_DURATION_MINUTES);
    if !minutes.is_finite() || minutes < 0.0 || minutes > MAX_DURATION_MINUTES {
        return Err(ValidationError::InvalidDuration);
    }
    Ok(minutes)
}
