use serde_json::json;
use std::str::FromStr;
use std::sync::Arc;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString};

use crate::errors::{AgentError, AgentResult};
use crate::lookup::{LookupError, MovieLookup};
use crate::models::function_call::FunctionCall;
use crate::models::tool::Tool;

/// The functions the assistant knows how to carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, EnumString, Display)]
#[strum(serialize_all = "snake_case")]
pub enum Capability {
    GetNowPlayingMovies,
    GetShowtimes,
    BuyTicket,
    ConfirmTicketPurchase,
}

impl Capability {
    /// The schema the model sees for this capability
    pub fn tool(&self) -> Tool {
        let ticket = json!({
            "type": "object",
            "properties": {
                "theater": {"type": "string", "description": "Theater name"},
                "movie": {"type": "string", "description": "Movie title"},
                "showtime": {"type": "string", "description": "Showtime, e.g. 7:00 PM"}
            },
            "required": ["theater", "movie", "showtime"]
        });

        match self {
            Capability::GetNowPlayingMovies => Tool::new(
                self.to_string(),
                "List the movies currently playing in theaters",
                json!({
                    "type": "object",
                    "properties": {
                        "location": {"type": "string", "description": "City and state, e.g. Chicago, IL"}
                    },
                    "required": []
                }),
            ),
            Capability::GetShowtimes => Tool::new(
                self.to_string(),
                "Find showtimes for a movie near a location",
                json!({
                    "type": "object",
                    "properties": {
                        "title": {"type": "string", "description": "Movie title"},
                        "location": {"type": "string", "description": "City and state, e.g. Chicago, IL"}
                    },
                    "required": ["title", "location"]
                }),
            ),
            Capability::BuyTicket => Tool::new(
                self.to_string(),
                "Ask the user to approve a ticket purchase before it is made",
                ticket,
            ),
            Capability::ConfirmTicketPurchase => Tool::new(
                self.to_string(),
                "Complete a ticket purchase the user has approved",
                ticket,
            ),
        }
    }
}

/// What the conversation loop should do after a call was dispatched
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Feed this observation back to the model and ask again
    Observe(String),
    /// End the turn without another reply
    Halt,
}

/// Maps function names to the operations behind them
pub struct Dispatcher {
    lookup: Arc<dyn MovieLookup>,
}

impl Dispatcher {
    pub fn new(lookup: Arc<dyn MovieLookup>) -> Self {
        Self { lookup }
    }

    pub fn tools(&self) -> Vec<Tool> {
        Capability::iter().map(|capability| capability.tool()).collect()
    }

    /// Run a function call and describe its result for the model.
    ///
    /// Lookup failures are reported as observations; only an unrecognized
    /// function name is an error.
    pub async fn dispatch(&self, call: &FunctionCall) -> AgentResult<Dispatch> {
        let capability = Capability::from_str(&call.function_name)
            .map_err(|_| AgentError::UnknownCapability(call.function_name.clone()))?;
        tracing::info!(function = %capability, arguments = ?call.arguments, "dispatching function call");

        let observation = match capability {
            Capability::GetNowPlayingMovies => self.now_playing(call).await,
            Capability::GetShowtimes => self.showtimes(call).await,
            Capability::BuyTicket => buy_ticket(call),
            Capability::ConfirmTicketPurchase => {
                tracing::info!("ticket purchase finalization is not implemented, ending turn");
                return Ok(Dispatch::Halt);
            }
        };

        Ok(Dispatch::Observe(observation))
    }

    async fn now_playing(&self, call: &FunctionCall) -> String {
        match self.lookup.now_playing(call.argument("location")).await {
            Ok(movies) => {
                let list: Vec<String> = movies.iter().map(|movie| format!("- {}", movie)).collect();
                observed(call, format!("Now playing:\n{}", list.join("\n")))
            }
            Err(e) => no_results(call, e),
        }
    }

    async fn showtimes(&self, call: &FunctionCall) -> String {
        let (title, location) = match (call.argument("title"), call.argument("location")) {
            (Some(title), Some(location)) => (title, location),
            (None, _) => return no_results(call, LookupError::MissingArgument("title")),
            (_, None) => return no_results(call, LookupError::MissingArgument("location")),
        };

        match self.lookup.showtimes(title, location).await {
            Ok(showtimes) => {
                let list: Vec<String> = showtimes.iter().map(|s| format!("- {}", s)).collect();
                observed(
                    call,
                    format!("Showtimes for {} in {}:\n{}", title, location, list.join("\n")),
                )
            }
            Err(LookupError::NotFound(_)) => observed(
                call,
                format!("No showtimes found for {} in {}.", title, location),
            ),
            Err(e) => no_results(call, e),
        }
    }
}

fn observed(call: &FunctionCall, body: String) -> String {
    format!("Function call rationale: {}\n\n{}", call.rationale(), body)
}

fn no_results(call: &FunctionCall, error: LookupError) -> String {
    tracing::warn!(function = %call.function_name, "lookup failed: {}", error);
    observed(call, format!("No results found: {}", error))
}

/// Stage a purchase; nothing is bought until the user approves
fn buy_ticket(call: &FunctionCall) -> String {
    let mut details = Vec::with_capacity(3);
    for name in ["theater", "movie", "showtime"] {
        match call.argument_text(name) {
            Some(value) => details.push(value),
            None => {
                return format!(
                    "Unable to stage the ticket purchase: missing argument `{}`. Ask the user for it.",
                    name
                )
            }
        }
    }

    format!(
        "Please confirm the following ticket details:\nTheater: {}\nMovie: {}\nShowtime: {}\nAsk the user if they want to proceed with the purchase.",
        details[0], details[1], details[2],
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::tests::sample_catalog;

    fn dispatcher() -> Dispatcher {
        Dispatcher::new(Arc::new(sample_catalog()))
    }

    #[test]
    fn test_capability_names() {
        let names: Vec<String> = Capability::iter().map(|c| c.to_string()).collect();
        assert_eq!(
            names,
            vec![
                "get_now_playing_movies",
                "get_showtimes",
                "buy_ticket",
                "confirm_ticket_purchase"
            ]
        );
        assert_eq!(
            Capability::from_str("get_showtimes").unwrap(),
            Capability::GetShowtimes
        );
    }

    #[test]
    fn test_tools_declare_required_fields() {
        let tools = dispatcher().tools();
        assert_eq!(tools.len(), 4);
        assert_eq!(tools[1].required(), vec!["title", "location"]);
        assert!(tools[0].required().is_empty());
    }

    #[tokio::test]
    async fn test_now_playing() {
        let call = FunctionCall::new("get_now_playing_movies", json!({"location": "Chicago, IL"}))
            .with_rationale("user asked");

        let Dispatch::Observe(text) = dispatcher().dispatch(&call).await.unwrap() else {
            panic!("expected an observation");
        };
        assert!(text.starts_with("Function call rationale: user asked\n\n"));
        assert!(text.contains("- Oppenheimer"));
        assert!(text.contains("- Barbie"));
    }

    #[tokio::test]
    async fn test_showtimes() {
        let call = FunctionCall::new(
            "get_showtimes",
            json!({"title": "Oppenheimer", "location": "Chicago, IL"}),
        );

        let Dispatch::Observe(text) = dispatcher().dispatch(&call).await.unwrap() else {
            panic!("expected an observation");
        };
        assert!(text.contains("Showtimes for Oppenheimer in Chicago, IL:"));
        assert!(text.contains("AMC River East 21: 4:00 PM, 7:30 PM"));
    }

    #[tokio::test]
    async fn test_no_showtimes_found() {
        let call = FunctionCall::new(
            "get_showtimes",
            json!({"title": "Barbie", "location": "Boise, ID"}),
        );
        let result = dispatcher().dispatch(&call).await.unwrap();
        assert_eq!(
            result,
            Dispatch::Observe(
                "Function call rationale: \n\nNo showtimes found for Barbie in Boise, ID.".into()
            )
        );
    }

    #[tokio::test]
    async fn test_missing_argument_reports_no_results() {
        let call = FunctionCall::new("get_showtimes", json!({"title": "Barbie"}));
        let Dispatch::Observe(text) = dispatcher().dispatch(&call).await.unwrap() else {
            panic!("expected an observation");
        };
        assert!(text.ends_with("No results found: missing argument `location`"));
    }

    #[tokio::test]
    async fn test_buy_ticket_stages_confirmation() {
        let call = FunctionCall::new(
            "buy_ticket",
            json!({
                "theater": "AMC River East 21",
                "movie": "Oppenheimer",
                "showtime": "7:30 PM"
            }),
        );
        let result = dispatcher().dispatch(&call).await.unwrap();
        assert_eq!(
            result,
            Dispatch::Observe(
                "Please confirm the following ticket details:\nTheater: AMC River East 21\nMovie: Oppenheimer\nShowtime: 7:30 PM\nAsk the user if they want to proceed with the purchase.".into()
            )
        );
    }

    #[tokio::test]
    async fn test_buy_ticket_keeps_values_as_passed() {
        let call = FunctionCall::new(
            "buy_ticket",
            json!({
                "theater": " AMC River East 21",
                "movie": "Oppenheimer",
                "showtime": 1930
            }),
        );
        let result = dispatcher().dispatch(&call).await.unwrap();
        assert_eq!(
            result,
            Dispatch::Observe(
                "Please confirm the following ticket details:\nTheater:  AMC River East 21\nMovie: Oppenheimer\nShowtime: 1930\nAsk the user if they want to proceed with the purchase.".into()
            )
        );
    }

    #[tokio::test]
    async fn test_buy_ticket_missing_argument() {
        let call = FunctionCall::new("buy_ticket", json!({"movie": "Oppenheimer"}));
        let Dispatch::Observe(text) = dispatcher().dispatch(&call).await.unwrap() else {
            panic!("expected an observation");
        };
        assert!(text.contains("missing argument `theater`"));
    }

    #[tokio::test]
    async fn test_confirm_purchase_halts() {
        let call = FunctionCall::new("confirm_ticket_purchase", json!({}));
        assert_eq!(dispatcher().dispatch(&call).await.unwrap(), Dispatch::Halt);
    }

    #[tokio::test]
    async fn test_unknown_function() {
        let call = FunctionCall::new("order_popcorn", json!({}));
        assert_eq!(
            dispatcher().dispatch(&call).await,
            Err(AgentError::UnknownCapability("order_popcorn".to_string()))
        );
    }
}
