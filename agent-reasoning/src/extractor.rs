//! Multi-strategy extraction of reasoning components from conversation text.

use std::collections::HashSet;

use agent_primitives::{
    ConversationMessage, ProposedAction, QuantitativeAnalysis, ReasoningRecord,
};
use regex::Regex;
use serde_json::Value;
use tracing::debug;

use crate::config::ExtractionConfig;
use crate::lexicon::{
    CueLexicon, CueMatch, MatchMode, Span, clauses, dedup_key, earliest_longest, list_item_body,
    strip_list_marker, truncate_chars,
};
use crate::normalizer::{MessageNormalizer, NormalizedConversation};
use crate::{ExtractionError, ExtractionResult};

const SENTENCE_END: [char; 3] = ['.', '!', '?'];

/// Produces [`ReasoningRecord`] skeletons from normalised conversation text.
///
/// Strategies run in a fixed order and never read each other's output:
/// situation, quantitative analysis, options, rationale, risks. The selected
/// action is copied from the caller verbatim.
#[derive(Debug, Clone)]
pub struct Extractor {
    config: ExtractionConfig,
    situation: CueLexicon,
    decision: CueLexicon,
    rationale: CueLexicon,
    risk: CueLexicon,
    option: CueLexicon,
    option_header: CueLexicon,
    amount: Regex,
    percentage: Regex,
    metric: Regex,
}

impl Extractor {
    /// Compiles the configured lexicons and patterns.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::Configuration`] when the configuration fails
    /// validation and [`ExtractionError::Pattern`] when a pattern does not compile.
    pub fn new(config: ExtractionConfig) -> ExtractionResult<Self> {
        config.validate()?;

        let amount = Regex::new(&config.amount_pattern)?;
        let percentage = Regex::new(&config.percentage_pattern)?;
        let metric = Regex::new(&format!(
            r"(?P<label>{})\s*[:=]\s*(?P<value>(?:{})|(?:{}))",
            config.metric_label_pattern, config.amount_pattern, config.percentage_pattern
        ))?;

        Ok(Self {
            situation: CueLexicon::new(&config.situation_cues, MatchMode::WholeWord),
            decision: CueLexicon::new(&config.decision_cues, MatchMode::WholeWord),
            rationale: CueLexicon::new(&config.rationale_cues, MatchMode::WholeWord),
            risk: CueLexicon::new(&config.risk_cues, MatchMode::Prefix),
            option: CueLexicon::new(&config.option_cues, MatchMode::WholeWord),
            option_header: CueLexicon::new(&config.option_header_cues, MatchMode::Prefix),
            amount,
            percentage,
            metric,
            config,
        })
    }

    /// Returns the active configuration.
    #[must_use]
    pub fn config(&self) -> &ExtractionConfig {
        &self.config
    }

    /// Extracts a record from already-normalised text.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractionError::InvalidInput`] when no proposed action is
    /// supplied; no partial record is produced.
    pub fn extract(
        &self,
        agent_id: &str,
        agent_role: &str,
        task: &str,
        conversation: &NormalizedConversation,
        action: Option<&ProposedAction>,
    ) -> ExtractionResult<ReasoningRecord> {
        let Some(action) = action else {
            return Err(ExtractionError::InvalidInput(
                "a proposed action is required for extraction",
            ));
        };

        let narrative = conversation.narrative();
        let situation = self.situation(narrative);
        let analysis = self.quantitative_analysis(conversation);
        let options = self.options(narrative);
        let rationale = self.rationale(narrative);
        let risks = self.risks(narrative);

        let record = ReasoningRecord::builder(action.clone())
            .provenance(agent_id, agent_role, task)
            .situation(situation)
            .quantitative_analysis(analysis)
            .options(options)
            .rationale(rationale)
            .risks(risks)
            .build();

        debug!(
            record_id = %record.id(),
            agent_id,
            segments = conversation.segments().len(),
            amounts = record.quantitative_analysis().amounts.len(),
            options = record.options().len(),
            risks = record.risks().len(),
            "reasoning extracted"
        );

        Ok(record)
    }

    /// Normalises `messages` and extracts a record in one step.
    ///
    /// # Errors
    ///
    /// See [`Extractor::extract`].
    pub fn extract_conversation(
        &self,
        agent_id: &str,
        agent_role: &str,
        task: &str,
        messages: &[ConversationMessage],
        action: Option<&ProposedAction>,
    ) -> ExtractionResult<ReasoningRecord> {
        let conversation = MessageNormalizer::normalize(messages, action);
        self.extract(agent_id, agent_role, task, &conversation, action)
    }

    fn situation(&self, text: &str) -> String {
        let horizon = self.decision.first(text).map_or(text.len(), |cue| cue.start);

        let candidates = self
            .situation
            .find_all(text)
            .into_iter()
            .filter(|cue| cue.end <= horizon)
            .filter_map(|cue| {
                let body = situation_body(text, cue, horizon);
                let body = truncate_chars(body, self.config.situation_window).trim();
                (body.chars().count() >= self.config.min_situation_span).then(|| Span {
                    position: cue.start,
                    text: body.to_owned(),
                })
            })
            .collect();

        earliest_longest(candidates)
            .map(|span| span.text)
            .unwrap_or_default()
    }

    fn quantitative_analysis(&self, conversation: &NormalizedConversation) -> QuantitativeAnalysis {
        let mut analysis = QuantitativeAnalysis::default();

        for segment in conversation.segments() {
            let text = segment.text.as_str();
            analysis
                .amounts
                .extend(self.amount.find_iter(text).map(|m| m.as_str().to_owned()));
            analysis
                .percentages
                .extend(self.percentage.find_iter(text).map(|m| m.as_str().to_owned()));

            for caps in self.metric.captures_iter(text) {
                let (Some(label), Some(value)) = (caps.name("label"), caps.name("value")) else {
                    continue;
                };
                let key = metric_key(label.as_str());
                if !key.is_empty() {
                    analysis
                        .metrics
                        .entry(key)
                        .or_insert_with(|| Value::String(value.as_str().to_owned()));
                }
            }

            if segment.role.is_tool() {
                if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(text) {
                    for (key, value) in fields {
                        if is_scalar(&value) {
                            analysis.metrics.entry(key).or_insert(value);
                        }
                    }
                }
            }
        }

        analysis
    }

    fn options(&self, text: &str) -> Vec<String> {
        let mut collector = Collector::new(self.config.max_options);
        let mut in_block = false;

        for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
            if collector.is_full() {
                break;
            }

            if let Some(body) = list_item_body(line) {
                if in_block {
                    if body.chars().count() >= self.config.min_option_length {
                        collector.push(trim_sentence(body));
                    }
                } else {
                    self.inline_options(body, &mut collector);
                }
                continue;
            }

            in_block = line.ends_with(':') && self.option_header.contains(line);
            if !in_block {
                self.inline_options(line, &mut collector);
            }
        }

        collector.into_vec()
    }

    fn inline_options(&self, text: &str, collector: &mut Collector) {
        for clause in clauses(text) {
            let Some(cue) = self.option.first(clause) else {
                continue;
            };
            let body = trim_sentence(after_cue(clause, cue));
            if body.chars().count() >= self.config.min_option_length {
                collector.push(body);
            }
        }
    }

    fn rationale(&self, text: &str) -> String {
        let candidates = self
            .rationale
            .find_all(text)
            .into_iter()
            .filter_map(|cue| {
                let rest = after_cue(text, cue);
                let sentence = clauses(rest).into_iter().next()?;
                let body = trim_sentence(truncate_chars(sentence, self.config.rationale_window));
                (body.chars().count() >= self.config.min_rationale_span).then(|| Span {
                    position: cue.start,
                    text: body.to_owned(),
                })
            })
            .collect();

        earliest_longest(candidates)
            .map(|span| span.text)
            .unwrap_or_default()
    }

    fn risks(&self, text: &str) -> Vec<String> {
        let mut collector = Collector::new(self.config.max_risks);

        for clause in clauses(text) {
            if collector.is_full() {
                break;
            }
            let body = strip_list_marker(clause);
            if body.ends_with(':') || !self.risk.contains(body) {
                continue;
            }
            let body = trim_sentence(body);
            if body.chars().count() >= self.config.min_risk_length {
                collector.push(body);
            }
        }

        collector.into_vec()
    }
}

/// Ordered, deduplicated, capped accumulator.
struct Collector {
    items: Vec<String>,
    seen: HashSet<String>,
    cap: usize,
}

impl Collector {
    fn new(cap: usize) -> Self {
        Self {
            items: Vec::new(),
            seen: HashSet::new(),
            cap,
        }
    }

    fn is_full(&self) -> bool {
        self.items.len() >= self.cap
    }

    fn push(&mut self, item: &str) {
        if !self.is_full() && self.seen.insert(dedup_key(item)) {
            self.items.push(item.to_owned());
        }
    }

    fn into_vec(self) -> Vec<String> {
        self.items
    }
}

/// Text of a situation candidate.
///
/// Header-style cues (`Situation: ...`) yield the text after the colon;
/// sentence-style cues (`Currently the book ...`) keep the cue itself. The
/// body ends at the first paragraph break or at the decision horizon.
fn situation_body(text: &str, cue: CueMatch, horizon: usize) -> &str {
    let after = &text[cue.end..horizon];
    let leading = after.len() - after.trim_start_matches([' ', '\t']).len();
    let start = if after[leading..].starts_with(':') {
        cue.end + leading + 1
    } else {
        cue.start
    };

    let body = text[start..horizon].trim_start();
    match body.find("\n\n") {
        Some(end) => &body[..end],
        None => body,
    }
}

fn after_cue(text: &str, cue: CueMatch) -> &str {
    text[cue.end..].trim_start_matches(|c: char| c == ':' || c == ',' || c.is_whitespace())
}

fn trim_sentence(text: &str) -> &str {
    text.trim().trim_end_matches(SENTENCE_END).trim_end()
}

fn metric_key(label: &str) -> String {
    let mut key = String::with_capacity(label.len());
    for c in label.trim().chars() {
        if c.is_alphanumeric() {
            key.extend(c.to_lowercase());
        } else if !key.ends_with('_') {
            key.push('_');
        }
    }
    key.trim_matches('_').to_owned()
}

fn is_scalar(value: &Value) -> bool {
    matches!(value, Value::Number(_) | Value::String(_) | Value::Bool(_))
}
