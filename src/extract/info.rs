//! Pure fact extractors over unstructured transcript text.
//!
//! Absence of a match is always `None`/`Unknown`, never an error: a chunk
//! that tells us nothing is the normal case mid-call.

use serde::{Deserialize, Serialize};

/// Three-valued flag: explicitly true, explicitly false, or no signal yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriState {
    Yes,
    No,
    #[default]
    Unknown,
}

impl TriState {
    /// True when either an affirmative or negative signal has been seen.
    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }

    pub fn from_bool(value: bool) -> Self {
        if value { TriState::Yes } else { TriState::No }
    }
}

/// Facts captured about the call so far.
///
/// Field names serialize in the wire/persisted-record shape.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedInfo {
    pub job: Option<String>,
    pub postcode: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub is_decision_maker: TriState,
    pub is_remote: TriState,
    pub has_tenant: TriState,
}

impl CapturedInfo {
    /// Merge `newer` into `self`, keeping whatever was determined first.
    ///
    /// Streaming semantics: a later chunk must not overwrite a value an
    /// earlier chunk already established.
    pub fn merge_keep_first(&mut self, newer: &CapturedInfo) {
        if self.job.is_none() {
            self.job = newer.job.clone();
        }
        if self.postcode.is_none() {
            self.postcode = newer.postcode.clone();
        }
        if self.name.is_none() {
            self.name = newer.name.clone();
        }
        if self.contact.is_none() {
            self.contact = newer.contact.clone();
        }
        if !self.is_decision_maker.is_known() {
            self.is_decision_maker = newer.is_decision_maker;
        }
        if !self.is_remote.is_known() {
            self.is_remote = newer.is_remote;
        }
        if !self.has_tenant.is_known() {
            self.has_tenant = newer.has_tenant;
        }
    }

    /// Apply an explicit correction, overwriting any field the update names.
    pub fn apply_update(&mut self, update: &CapturedInfoUpdate) {
        if let Some(job) = &update.job {
            self.job = Some(job.clone());
        }
        if let Some(postcode) = &update.postcode {
            self.postcode = Some(postcode.clone());
        }
        if let Some(name) = &update.name {
            self.name = Some(name.clone());
        }
        if let Some(contact) = &update.contact {
            self.contact = Some(contact.clone());
        }
        if let Some(flag) = update.is_decision_maker {
            self.is_decision_maker = flag;
        }
        if let Some(flag) = update.is_remote {
            self.is_remote = flag;
        }
        if let Some(flag) = update.has_tenant {
            self.has_tenant = flag;
        }
    }
}

/// Partial update to `CapturedInfo`; only named fields are written.
///
/// This is the explicit correction channel, distinct from the streaming
/// extractor's keep-first accumulation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CapturedInfoUpdate {
    pub job: Option<String>,
    pub postcode: Option<String>,
    pub name: Option<String>,
    pub contact: Option<String>,
    pub is_decision_maker: Option<TriState>,
    pub is_remote: Option<TriState>,
    pub has_tenant: Option<TriState>,
}

/// Who spoke a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Caller,
    Agent,
}

/// One speaker-tagged turn of the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub text: String,
}

/// Job nouns recognized in caller speech, longest first so that specific
/// phrases win over their substrings.
const JOB_NOUNS: &[&str] = &[
    "washing machine",
    "light fitting",
    "flat pack",
    "radiator",
    "dishwasher",
    "bathroom",
    "guttering",
    "shelves",
    "boiler",
    "shower",
    "toilet",
    "kitchen",
    "gutter",
    "fence",
    "shelf",
    "socket",
    "drain",
    "tiles",
    "leak",
    "door",
    "lock",
    "sink",
    "tap",
];

/// Descriptor words that, immediately before a job noun, belong to the job
/// description ("leaking tap", "fit shelves").
const JOB_QUALIFIERS: &[&str] = &[
    "leaking", "leaky", "dripping", "broken", "blocked", "burst", "faulty", "squeaky", "jammed",
    "sticking", "cracked", "new", "fit", "fix", "install", "replace", "hang", "mount", "repair",
];

/// Linking verbs that can join a noun to a trailing condition
/// ("boiler is leaking").
const JOB_LINKERS: &[&str] = &["is", "was", "keeps", "has", "won't", "isn't", "wont", "isnt"];

fn is_word_boundary(text: &str, index: usize) -> bool {
    if index == 0 || index >= text.len() {
        return true;
    }
    !text.as_bytes()[index - 1].is_ascii_alphanumeric()
}

/// Extract a job/issue description if a recognizable job phrase is present.
///
/// Matching is phrase-based and case-insensitive; the returned string
/// preserves the caller's own wording for the matched span.
pub fn extract_job(text: &str) -> Option<String> {
    // Lowercasing can change byte lengths (İ grows, ẞ shrinks), so all span
    // arithmetic happens on the folded string and `byte_map` carries each
    // folded byte back to the start of its original char.
    let mut lower = String::with_capacity(text.len());
    let mut byte_map = Vec::with_capacity(text.len() + 1);
    for (orig, ch) in text.char_indices() {
        for folded in ch.to_lowercase() {
            lower.push(folded);
        }
        byte_map.resize(lower.len(), orig);
    }
    byte_map.push(text.len());

    for noun in JOB_NOUNS {
        let mut search_from = 0;
        while let Some(rel) = lower[search_from..].find(noun) {
            let start = search_from + rel;
            let end = start + noun.len();
            let boundary_ok = is_word_boundary(&lower, start)
                && lower[end..]
                    .chars()
                    .next()
                    .map(|c| !c.is_ascii_alphanumeric())
                    .unwrap_or(true);
            if !boundary_ok {
                search_from = end;
                continue;
            }

            let mut span_start = start;
            let mut span_end = end;

            // Pull in a preceding qualifier word ("leaking tap", "fix boiler")
            let before: Vec<(usize, &str)> = lower[..start]
                .split_whitespace()
                .map(|w| (w.as_ptr() as usize - lower.as_ptr() as usize, w))
                .collect();
            if let Some((offset, word)) = before.last() {
                let trimmed = word.trim_matches(|c: char| !c.is_ascii_alphanumeric());
                if JOB_QUALIFIERS.contains(&trimmed) {
                    span_start = *offset;
                }
            }

            // Pull in a trailing condition ("boiler is leaking")
            let after: Vec<&str> = lower[end..].split_whitespace().take(2).collect();
            if after.len() == 2 && JOB_LINKERS.contains(&after[0]) {
                let condition = after[1].trim_matches(|c: char| !c.is_ascii_alphanumeric());
                if condition.ends_with("ing")
                    || condition.ends_with("ed")
                    || JOB_QUALIFIERS.contains(&condition)
                {
                    if let Some(rel2) = lower[end..].find(condition) {
                        span_end = end + rel2 + condition.len();
                    }
                }
            }

            let orig_start = byte_map[span_start];
            let orig_end = if span_end >= lower.len() {
                text.len()
            } else {
                byte_map[span_end]
            };
            return Some(text[orig_start..orig_end].trim().to_string());
        }
    }
    None
}

fn is_outward_code(token: &str) -> bool {
    // Outward code grammar: 1-2 letters, then 1-2 digits, optionally a
    // trailing letter (e.g. SW11, N1, EC1A, W1A).
    let bytes = token.as_bytes();
    if bytes.len() < 2 || bytes.len() > 4 {
        return false;
    }
    let letters = bytes.iter().take_while(|b| b.is_ascii_alphabetic()).count();
    if letters == 0 || letters > 2 {
        return false;
    }
    let rest = &bytes[letters..];
    let digits = rest.iter().take_while(|b| b.is_ascii_digit()).count();
    if digits == 0 || digits > 2 {
        return false;
    }
    let tail = &rest[digits..];
    tail.is_empty() || (tail.len() == 1 && tail[0].is_ascii_alphabetic())
}

fn is_inward_code(token: &str) -> bool {
    // Inward code grammar: one digit then two letters (e.g. 2AB).
    let bytes = token.as_bytes();
    bytes.len() == 3
        && bytes[0].is_ascii_digit()
        && bytes[1].is_ascii_alphabetic()
        && bytes[2].is_ascii_alphabetic()
}

/// Validate a full UK postcode (outward + inward), tolerating a missing or
/// doubled space.
pub fn is_valid_uk_postcode(candidate: &str) -> bool {
    normalize_postcode(candidate).is_some()
}

/// Normalize a full UK postcode to canonical form: uppercase with a single
/// space before the inward code (`sw112ab` → `SW11 2AB`).
///
/// Returns `None` when the input is not a full UK postcode.
pub fn normalize_postcode(candidate: &str) -> Option<String> {
    let compact: String = candidate
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_uppercase();
    if compact.len() < 5 || compact.len() > 7 {
        return None;
    }
    let split = compact.len() - 3;
    let (outward, inward) = compact.split_at(split);
    if is_outward_code(outward) && is_inward_code(inward) {
        Some(format!("{} {}", outward, inward))
    } else {
        None
    }
}

fn clean_token(raw: &str) -> &str {
    raw.trim_matches(|c: char| !c.is_ascii_alphanumeric())
}

/// Extract the most specific location available: a full postcode, else a
/// partial outward code, else a bare place name mentioned as "in <Area>".
pub fn extract_postcode(text: &str) -> Option<String> {
    let tokens: Vec<&str> = text.split_whitespace().map(clean_token).collect();

    // Full postcode, either as one run ("SW112AB") or split ("SW11 2AB")
    for window in tokens.windows(2) {
        if let Some(full) = normalize_postcode(&format!("{}{}", window[0], window[1])) {
            return Some(full);
        }
    }
    for token in &tokens {
        if let Some(full) = normalize_postcode(token) {
            return Some(full);
        }
    }

    // Partial outward code ("SW11")
    for token in &tokens {
        let upper = token.to_uppercase();
        if token.len() >= 2 && is_outward_code(&upper) {
            return Some(upper);
        }
    }

    // Bare place name: "in Clapham", "in the Battersea area"
    let words: Vec<&str> = text.split_whitespace().collect();
    for (i, word) in words.iter().enumerate() {
        if !word.eq_ignore_ascii_case("in") {
            continue;
        }
        let mut j = i + 1;
        if words.get(j).map(|w| w.eq_ignore_ascii_case("the")) == Some(true) {
            j += 1;
        }
        if let Some(next) = words.get(j) {
            let cleaned = clean_token(next);
            if cleaned.chars().next().map(|c| c.is_uppercase()) == Some(true)
                && cleaned.chars().all(|c| c.is_ascii_alphabetic())
            {
                return Some(cleaned.to_string());
            }
        }
    }

    None
}

fn contains_phrase(lower: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| lower.contains(p))
}

const DECISION_MAKER_NO: &[&str] = &[
    "for my boss",
    "getting quotes for",
    "quotes for my",
    "on behalf of",
    "ask my",
    "check with my",
    "my landlord deals",
    "not my decision",
    "not up to me",
];

const DECISION_MAKER_YES: &[&str] = &[
    "my house",
    "my home",
    "my flat",
    "my property",
    "i own",
    "i'm the owner",
    "im the owner",
    "homeowner",
    "my decision",
    "up to me",
];

/// Detect whether the caller can authorize the work.
///
/// Negations are checked first so "I'm just getting quotes for my boss"
/// resolves to `No` even though it mentions ownership-adjacent words.
pub fn detect_decision_maker(text: &str) -> TriState {
    let lower = text.to_lowercase();
    if contains_phrase(&lower, DECISION_MAKER_NO) {
        TriState::No
    } else if contains_phrase(&lower, DECISION_MAKER_YES) {
        TriState::Yes
    } else {
        TriState::Unknown
    }
}

const REMOTE_NO: &[&str] = &[
    "i live there",
    "i live here",
    "i'm at the property",
    "im at the property",
    "i'm home",
    "im home",
    "i'm there now",
    "im there now",
    "i'm in the house",
];

const REMOTE_YES: &[&str] = &[
    "i'm not there",
    "im not there",
    "not at the property",
    "i live abroad",
    "i'm away",
    "im away",
    "i'm overseas",
    "im overseas",
    "live elsewhere",
    "different city",
    "remotely",
    "don't live there",
    "dont live there",
];

/// Detect whether the caller is physically away from the property.
pub fn detect_remote(text: &str) -> TriState {
    let lower = text.to_lowercase();
    if contains_phrase(&lower, REMOTE_NO) {
        TriState::No
    } else if contains_phrase(&lower, REMOTE_YES) {
        TriState::Yes
    } else {
        TriState::Unknown
    }
}

const TENANT_NO: &[&str] = &[
    "no tenant",
    "no tenants",
    "between tenants",
    "empty property",
    "property is empty",
    "it's vacant",
    "its vacant",
    "unoccupied",
];

const TENANT_YES: &[&str] = &[
    "my tenant",
    "the tenant",
    "tenants",
    "tenanted",
    "my lodger",
    "the renter",
    "renters",
];

/// Detect whether a third-party occupant lives at the property.
pub fn detect_tenant(text: &str) -> TriState {
    let lower = text.to_lowercase();
    if contains_phrase(&lower, TENANT_NO) {
        TriState::No
    } else if contains_phrase(&lower, TENANT_YES) {
        TriState::Yes
    } else {
        TriState::Unknown
    }
}

/// Run every extractor over a flat piece of text.
pub fn extract_info(text: &str) -> CapturedInfo {
    CapturedInfo {
        job: extract_job(text),
        postcode: extract_postcode(text),
        name: None,
        contact: None,
        is_decision_maker: detect_decision_maker(text),
        is_remote: detect_remote(text),
        has_tenant: detect_tenant(text),
    }
}

/// Run every extractor over a speaker-tagged transcript, considering only
/// the caller's own utterances.
pub fn extract_info_from_entries(entries: &[TranscriptEntry]) -> CapturedInfo {
    let caller_text: String = entries
        .iter()
        .filter(|e| e.speaker == Speaker::Caller)
        .map(|e| e.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    extract_info(&caller_text)
}
