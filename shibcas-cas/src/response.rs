//! Parsing of CAS validation responses.

use crate::{Assertion, AttributePrincipal, Result, TicketValidationError};
use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Failure code used when a CAS 1.0 server answers `no`.
pub const CAS10_REJECTION_CODE: &str = "INVALID_TICKET";

/// Parse the plain-text CAS 1.0 `/validate` answer.
pub fn parse_cas10_response(body: &str) -> Result<Assertion> {
    let mut lines = body.lines().map(str::trim);

    match lines.next() {
        Some("yes") => {
            let user = lines
                .next()
                .filter(|user| !user.is_empty())
                .ok_or_else(|| {
                    TicketValidationError::MalformedResponse(
                        "CAS 1.0 answer 'yes' carried no username".to_string(),
                    )
                })?;
            Ok(Assertion::new(user))
        }
        Some("no") => Err(TicketValidationError::Rejected {
            code: CAS10_REJECTION_CODE.to_string(),
            message: "CAS 1.0 server answered 'no'".to_string(),
        }),
        _ => Err(TicketValidationError::MalformedResponse(format!(
            "unexpected CAS 1.0 answer: {:?}",
            body.chars().take(64).collect::<String>()
        ))),
    }
}

/// Parse a CAS 2.0/3.0 `serviceResponse` XML document.
///
/// Children of `cas:attributes` become attributes; repeated elements
/// accumulate into one multi-valued attribute.
pub fn parse_service_response(xml: &str) -> Result<Assertion> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<String> = Vec::new();
    let mut success = false;
    let mut user: Option<String> = None;
    let mut principal = AttributePrincipal::new(String::new());
    let mut failure: Option<(String, String)> = None;

    let mut buf = Vec::new();
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                match local.as_str() {
                    "authenticationSuccess" => success = true,
                    "authenticationFailure" => failure = Some((failure_code(e)?, String::new())),
                    _ => {}
                }
                stack.push(local);
            }
            Ok(Event::Empty(ref e)) => {
                let local = String::from_utf8_lossy(e.local_name().into_inner()).to_string();
                if local == "authenticationFailure" {
                    failure = Some((failure_code(e)?, String::new()));
                } else if parent_is(&stack, "attributes") {
                    principal.attributes.entry(local).or_default();
                }
            }
            Ok(Event::Text(ref e)) => {
                let text = e
                    .unescape()
                    .map_err(|e| TicketValidationError::MalformedResponse(e.to_string()))?
                    .to_string();
                collect_text(&stack, text, &mut user, &mut principal, &mut failure);
            }
            Ok(Event::CData(e)) => {
                let text = String::from_utf8_lossy(&e.into_inner()).trim().to_string();
                collect_text(&stack, text, &mut user, &mut principal, &mut failure);
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(TicketValidationError::MalformedResponse(format!(
                    "XML parse error: {}",
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if let Some((code, message)) = failure {
        return Err(TicketValidationError::Rejected {
            code,
            message: message.trim().to_string(),
        });
    }

    if !success {
        return Err(TicketValidationError::MalformedResponse(
            "no authenticationSuccess or authenticationFailure element".to_string(),
        ));
    }

    principal.name = user
        .filter(|user| !user.is_empty())
        .ok_or_else(|| {
            TicketValidationError::MalformedResponse(
                "authenticationSuccess without cas:user".to_string(),
            )
        })?;

    Ok(Assertion::from_principal(principal))
}

fn failure_code(e: &quick_xml::events::BytesStart<'_>) -> Result<String> {
    for attr in e.attributes().flatten() {
        if attr.key.local_name().into_inner() == b"code" {
            let value = attr
                .unescape_value()
                .map_err(|e| TicketValidationError::MalformedResponse(e.to_string()))?;
            return Ok(value.trim().to_string());
        }
    }
    Ok("UNKNOWN".to_string())
}

fn parent_is(stack: &[String], name: &str) -> bool {
    stack.last().is_some_and(|top| top == name)
}

fn collect_text(
    stack: &[String],
    text: String,
    user: &mut Option<String>,
    principal: &mut AttributePrincipal,
    failure: &mut Option<(String, String)>,
) {
    let Some((top, ancestors)) = stack.split_last() else {
        return;
    };
    let parent = ancestors.last().map(String::as_str);

    match (parent, top.as_str()) {
        (Some("authenticationSuccess"), "user") => *user = Some(text),
        (Some("attributes"), name) => principal
            .attributes
            .entry(name.to_string())
            .or_default()
            .push(text),
        (_, "authenticationFailure") => {
            if let Some((_, message)) = failure.as_mut() {
                message.push_str(&text);
            }
        }
        _ => {}
    }
}
