//! Question routing: free text → graph query or explanatory delegation.
//!
//! Rules are an explicit ordered list of (predicate, handler) pairs. They are
//! tried top to bottom and the first match wins:
//!
//! 1. **Explanatory**: starts with "why"; delegated verbatim to the collaborator.
//! 2. **Fault-impact**: starts with "what happens if"; the rest is matched
//!    loosely against component names and answered with `downstream_impact`.
//! 3. **Control-logic**: mentions stop/start/cut-out/safety; answered with
//!    `who_affects("compressor")` whatever component the question names.
//!
//! Anything else falls through to the remote intent classifier, whose answer
//! is treated as untrusted. Classifier mistakes become
//! [`Answer::NotSupported`]; only transport failures surface as errors.

use miette::Diagnostic;
use serde_json::Value;
use thiserror::Error;

use crate::error::GraphError;
use crate::fact::strip_fences;
use crate::graph::resolve::resolve_by_token_subset;
use crate::graph::{PlantGraph, QueryEngine, QueryKind, QueryResult};
use crate::llm::{Collaborator, CollaboratorError};

/// Prefix that marks a fault-impact question.
pub const FAULT_PREFIX: &str = "what happens if";

/// Substrings that mark a control-logic question.
pub const CONTROL_KEYWORDS: [&str; 5] = ["stop", "start", "cut out", "cut-out", "safety"];

/// Component every control-logic question is answered for.
pub const CONTROL_TARGET: &str = "compressor";

/// Words dropped from a fault-impact question before matching.
const FAULT_FILLER: [&str; 3] = ["trips", "trip", "the"];

/// Errors from interpreting the classifier's answer.
#[derive(Debug, Error, Diagnostic)]
pub enum IntentError {
    #[error("classifier answer is not a JSON object: {message}")]
    #[diagnostic(
        code(reefer::intent::malformed),
        help("Rephrase the question, e.g. \"what does the condenser affect?\".")
    )]
    Malformed { message: String },

    #[error("classifier answer is missing `{field}`")]
    #[diagnostic(
        code(reefer::intent::incomplete),
        help("The question could not be reduced to a single graph query. Name one component.")
    )]
    Incomplete { field: &'static str },

    #[error("unknown query type '{query_type}'")]
    #[diagnostic(
        code(reefer::intent::unknown_query_type),
        help(
            "Supported queries: who_affects, what_it_affects, \
             upstream_dependencies, downstream_impact."
        )
    )]
    UnknownQueryType { query_type: String },
}

/// Which rule handled a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Explanatory,
    FaultImpact,
    ControlLogic,
    Structured,
}

impl Route {
    /// Banner shown before the answer.
    pub fn banner(self) -> &'static str {
        match self {
            Self::Explanatory => "Explanatory question detected.",
            Self::FaultImpact => "Fault-impact question detected.",
            Self::ControlLogic => "Control-logic question detected.",
            Self::Structured => "Structural question detected.",
        }
    }
}

/// A question as typed, plus its lower-cased form used for matching.
#[derive(Debug, Clone)]
pub struct Question {
    pub text: String,
    pub lower: String,
}

impl Question {
    pub fn new(raw: &str) -> Self {
        let text = raw.trim().to_string();
        let lower = text.to_lowercase();
        Self { text, lower }
    }
}

/// The (operation, component) pair a question was mapped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interpretation {
    pub query: QueryKind,
    pub component: String,
}

impl Interpretation {
    pub fn new(query: QueryKind, component: impl Into<String>) -> Self {
        Self {
            query,
            component: component.into(),
        }
    }
}

impl std::fmt::Display for Interpretation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}('{}')", self.query, self.component)
    }
}

/// What the router produced for one question.
#[derive(Debug)]
pub enum Answer {
    /// Free-text explanation from the collaborator.
    Explanation(String),
    /// A graph query ran.
    Graph {
        route: Route,
        interpretation: Interpretation,
        result: QueryResult,
    },
    /// The component could not be resolved. `interpretation` is set when the
    /// query was already chosen before resolution failed.
    NotFound {
        route: Route,
        interpretation: Option<Interpretation>,
        component: String,
    },
    /// The classifier's answer could not be turned into a query.
    NotSupported(IntentError),
}

impl Answer {
    pub fn route(&self) -> Route {
        match self {
            Self::Explanation(_) => Route::Explanatory,
            Self::Graph { route, .. } | Self::NotFound { route, .. } => *route,
            Self::NotSupported(_) => Route::Structured,
        }
    }

    /// The interpreted query, when there is one.
    pub fn interpretation(&self) -> Option<&Interpretation> {
        match self {
            Self::Graph { interpretation, .. } => Some(interpretation),
            Self::NotFound { interpretation, .. } => interpretation.as_ref(),
            _ => None,
        }
    }
}

impl std::fmt::Display for Answer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.route().banner())?;
        if let Some(interpretation) = self.interpretation() {
            writeln!(f, "→ Interpreted as: {interpretation}")?;
        }
        writeln!(f)?;

        match self {
            Self::Explanation(text) => write!(f, "{}", text.trim_end()),
            Self::Graph {
                interpretation,
                result,
                ..
            } => {
                writeln!(f, "Answer:")?;
                if result.is_empty() {
                    write!(f, " - {}", interpretation.query.none_found())
                } else {
                    let lines = result.lines();
                    for (i, line) in lines.iter().enumerate() {
                        write!(f, " - {line}")?;
                        if i + 1 < lines.len() {
                            writeln!(f)?;
                        }
                    }
                    Ok(())
                }
            }
            Self::NotFound {
                interpretation,
                component,
                ..
            } => {
                write!(f, "Component '{component}' not found in knowledge graph.")?;
                if interpretation.is_some() {
                    write!(f, "\nThis question cannot be answered structurally.")?;
                }
                Ok(())
            }
            Self::NotSupported(reason) => write!(
                f,
                "Could not map this question to a structured graph query ({reason}).\n\
                 Not supported in this version."
            ),
        }
    }
}

/// Borrowed state every handler sees.
struct RouteContext<'a> {
    queries: QueryEngine<'a>,
    collaborator: &'a dyn Collaborator,
}

type Handler = fn(&RouteContext<'_>, &Question) -> Result<Answer, CollaboratorError>;

/// One entry of the decision list.
struct Rule {
    route: Route,
    matches: fn(&Question) -> bool,
    handle: Handler,
}

/// The ordered prefix/keyword rules. The classifier fallback is not in this
/// list; it runs only when none of these match.
fn default_rules() -> Vec<Rule> {
    vec![
        Rule {
            route: Route::Explanatory,
            matches: |q| q.lower.starts_with("why"),
            handle: handle_explanatory,
        },
        Rule {
            route: Route::FaultImpact,
            matches: |q| q.lower.starts_with(FAULT_PREFIX),
            handle: handle_fault_impact,
        },
        Rule {
            route: Route::ControlLogic,
            matches: |q| CONTROL_KEYWORDS.iter().any(|k| q.lower.contains(k)),
            handle: handle_control_logic,
        },
    ]
}

/// Maps questions to graph queries over one immutable graph.
pub struct IntentRouter<'a> {
    context: RouteContext<'a>,
    rules: Vec<Rule>,
}

impl<'a> IntentRouter<'a> {
    pub fn new(graph: &'a PlantGraph, collaborator: &'a dyn Collaborator) -> Self {
        Self {
            context: RouteContext {
                queries: QueryEngine::new(graph),
                collaborator,
            },
            rules: default_rules(),
        }
    }

    /// Rule order, fallback last.
    pub fn routes(&self) -> Vec<Route> {
        self.rules
            .iter()
            .map(|r| r.route)
            .chain(std::iter::once(Route::Structured))
            .collect()
    }

    /// Which rule would handle `question`, without running it.
    pub fn select(&self, question: &str) -> Route {
        let q = Question::new(question);
        self.rules
            .iter()
            .find(|r| (r.matches)(&q))
            .map_or(Route::Structured, |r| r.route)
    }

    /// Answer one question.
    ///
    /// Resolution failures and classifier mistakes are part of the returned
    /// [`Answer`]. Only collaborator transport failures are errors.
    pub fn route(&self, question: &str) -> Result<Answer, CollaboratorError> {
        let q = Question::new(question);
        match self.rules.iter().find(|r| (r.matches)(&q)) {
            Some(rule) => {
                tracing::debug!(route = ?rule.route, question = %q.text, "rule matched");
                (rule.handle)(&self.context, &q)
            }
            None => {
                tracing::debug!(question = %q.text, "no rule matched, asking classifier");
                handle_structured(&self.context, &q)
            }
        }
    }
}

impl std::fmt::Debug for IntentRouter<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("IntentRouter")
            .field("graph", self.context.queries.graph())
            .field("routes", &self.routes())
            .finish()
    }
}

fn handle_explanatory(ctx: &RouteContext<'_>, q: &Question) -> Result<Answer, CollaboratorError> {
    let text = ctx.collaborator.explain(&q.text)?;
    Ok(Answer::Explanation(text))
}

fn handle_fault_impact(ctx: &RouteContext<'_>, q: &Question) -> Result<Answer, CollaboratorError> {
    let phrase = fault_subject(&q.lower);
    let name = match resolve_by_token_subset(ctx.queries.graph(), &phrase) {
        Ok(name) => name,
        Err(GraphError::ComponentNotFound { name }) => {
            tracing::warn!(phrase = %name, "fault-impact component not found");
            return Ok(Answer::NotFound {
                route: Route::FaultImpact,
                interpretation: None,
                component: name,
            });
        }
    };
    Ok(run_query(
        ctx,
        Route::FaultImpact,
        Interpretation::new(QueryKind::DownstreamImpact, name),
    ))
}

fn handle_control_logic(
    ctx: &RouteContext<'_>,
    _q: &Question,
) -> Result<Answer, CollaboratorError> {
    Ok(run_query(
        ctx,
        Route::ControlLogic,
        Interpretation::new(QueryKind::WhoAffects, CONTROL_TARGET),
    ))
}

fn handle_structured(ctx: &RouteContext<'_>, q: &Question) -> Result<Answer, CollaboratorError> {
    let raw = ctx.collaborator.classify(&q.text)?;
    match parse_intent(&raw) {
        Ok(interpretation) => Ok(run_query(ctx, Route::Structured, interpretation)),
        Err(e) => {
            tracing::warn!(error = %e, "classifier answer rejected");
            Ok(Answer::NotSupported(e))
        }
    }
}

fn run_query(ctx: &RouteContext<'_>, route: Route, interpretation: Interpretation) -> Answer {
    match ctx
        .queries
        .run(interpretation.query, &interpretation.component)
    {
        Ok(result) => Answer::Graph {
            route,
            interpretation,
            result,
        },
        Err(GraphError::ComponentNotFound { name }) => {
            tracing::warn!(component = %name, query = %interpretation.query, "component not found");
            Answer::NotFound {
                route,
                interpretation: Some(interpretation),
                component: name,
            }
        }
    }
}

/// The component phrase of a fault-impact question: prefix, filler words and
/// trailing punctuation removed.
pub fn fault_subject(lower: &str) -> String {
    let rest = lower.strip_prefix(FAULT_PREFIX).unwrap_or(lower);
    rest.split_whitespace()
        .map(|t| t.trim_end_matches(['?', '!', '.', ',']))
        .filter(|t| !t.is_empty() && !FAULT_FILLER.contains(t))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Parse a classifier answer into an interpretation.
///
/// Accepts fenced JSON, and a `query_type` with a parenthesized suffix such as
/// `"who_affects(component)"`.
pub fn parse_intent(raw: &str) -> Result<Interpretation, IntentError> {
    let text = strip_fences(raw);
    let value: Value = serde_json::from_str(&text).map_err(|e| IntentError::Malformed {
        message: e.to_string(),
    })?;
    let object = value.as_object().ok_or_else(|| IntentError::Malformed {
        message: "expected an object".into(),
    })?;

    let field = |name: &'static str| -> Result<&str, IntentError> {
        match object.get(name) {
            None | Some(Value::Null) => Err(IntentError::Incomplete { field: name }),
            Some(Value::String(s)) => Ok(s.as_str()),
            Some(_) => Err(IntentError::Malformed {
                message: format!("`{name}` is not a string"),
            }),
        }
    };

    let query_type = field("query_type")?;
    let component = field("component")?;

    let name = query_type.split('(').next().unwrap_or_default().trim();
    let query: QueryKind = name.parse()?;

    Ok(Interpretation::new(query, component))
}
