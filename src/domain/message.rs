use serde::Serialize;
use serde_json::{Value, json};

use crate::domain::ticket::{Ticket, non_blank};
use crate::domain::user::Employee;

pub const DESCRIPTION_LIMIT: usize = 500;
const MISSING: &str = "N/A";

/// Text plus Block Kit blocks, ready to be posted to any recipient.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationMessage {
    pub text: String,
    pub blocks: Vec<Value>,
}

/// Who asked for the ticket, as shown in the notification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Requester {
    pub name: Option<String>,
    pub email: Option<String>,
}

impl Requester {
    /// Contact fields carried on the ticket, overridden field by field by the
    /// related employee record when one was found.
    pub fn resolve(ticket: &Ticket, employee: Option<&Employee>) -> Self {
        let mut requester = Self {
            name: non_blank(ticket.contact_name.as_deref()).map(str::to_string),
            email: non_blank(ticket.contact_email.as_deref()).map(str::to_string),
        };
        if let Some(employee) = employee {
            if let Some(name) = non_blank(employee.name.as_deref()) {
                requester.name = Some(name.to_string());
            }
            if let Some(email) = non_blank(employee.email.as_deref()) {
                requester.email = Some(email.to_string());
            }
        }
        requester
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(MISSING)
    }
}

pub struct MessageContext<'a> {
    pub ticket_id: &'a str,
    pub ticket: &'a Ticket,
    pub requester: &'a Requester,
    pub ticket_url: &'a str,
}

impl MessageContext<'_> {
    fn folio(&self) -> &str {
        non_blank(self.ticket.folio.as_deref()).unwrap_or(self.ticket_id)
    }

    fn machine(&self) -> Option<&str> {
        non_blank(self.ticket.machine.as_deref())
    }

    fn element(&self) -> Option<&str> {
        non_blank(self.ticket.element_name.as_deref())
    }

    fn description(&self) -> Option<&str> {
        non_blank(self.ticket.description.as_deref())
    }
}

pub fn build_message(ctx: &MessageContext<'_>, template: Option<&str>) -> NotificationMessage {
    match template {
        Some(template) => build_custom_message(ctx, template),
        None => build_default_message(ctx),
    }
}

/// Substitutes placeholders in one pass over the template, so values that
/// happen to contain placeholder text are inserted verbatim.
pub fn render_template(template: &str, ctx: &MessageContext<'_>) -> String {
    let category = ctx.ticket.category_label();
    let mut text = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        text.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let substitution = after.find('}').and_then(|close| {
            placeholder_value(&after[..close], ctx, &category).map(|value| (close, value))
        });
        match substitution {
            Some((close, value)) => {
                text.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                text.push('{');
                rest = after;
            }
        }
    }
    text.push_str(rest);
    text
}

fn placeholder_value<'a>(
    name: &str,
    ctx: &'a MessageContext<'_>,
    category: &'a str,
) -> Option<&'a str> {
    let value = match name {
        "folio" => ctx.folio(),
        "ticketId" => ctx.ticket_id,
        "solicitante" => ctx.requester.display_name(),
        "email" => ctx.requester.email.as_deref().unwrap_or(MISSING),
        "prioridad" => ctx.ticket.priority().label(),
        "categoria" => category,
        "descripcion" => ctx.description().unwrap_or(""),
        "maquina" => ctx.machine().unwrap_or(MISSING),
        "elemento" => ctx.element().unwrap_or(MISSING),
        "url" => ctx.ticket_url,
        _ => return None,
    };
    Some(value)
}

fn build_custom_message(ctx: &MessageContext<'_>, template: &str) -> NotificationMessage {
    let text = render_template(template, ctx);
    NotificationMessage {
        blocks: vec![json!({
            "type": "section",
            "text": { "type": "mrkdwn", "text": text },
        })],
        text,
    }
}

fn build_default_message(ctx: &MessageContext<'_>) -> NotificationMessage {
    let folio = ctx.folio();
    let requester = match ctx.requester.email.as_deref() {
        Some(email) => format!(
            "{}\n<mailto:{email}|{email}>",
            escape_mrkdwn(ctx.requester.display_name())
        ),
        None => escape_mrkdwn(ctx.requester.display_name()),
    };

    let mut blocks = vec![
        json!({
            "type": "header",
            "text": { "type": "plain_text", "text": format!("🎫 Nuevo Ticket: {folio}"), "emoji": true },
        }),
        json!({
            "type": "section",
            "fields": [
                mrkdwn(format!("*Solicitante:*\n{requester}")),
                mrkdwn(format!("*Prioridad:*\n{}", ctx.ticket.priority().label())),
                mrkdwn(format!("*Categoría:*\n{}", escape_mrkdwn(&ctx.ticket.category_label()))),
                mrkdwn(format!("*Estado:*\n{}", ctx.ticket.status_label())),
            ],
        }),
    ];

    if let Some(description) = ctx.description() {
        blocks.push(section(format!(
            "*Descripción:*\n{}",
            escape_mrkdwn(&truncate_description(description))
        )));
    }
    if let Some(machine) = ctx.machine() {
        blocks.push(section(format!("*Máquina:* {}", escape_mrkdwn(machine))));
    }
    if let Some(element) = ctx.element() {
        blocks.push(section(format!("*Elemento:* {}", escape_mrkdwn(element))));
    }

    blocks.push(json!({
        "type": "actions",
        "elements": [{
            "type": "button",
            "text": { "type": "plain_text", "text": "Ver Ticket", "emoji": true },
            "url": ctx.ticket_url,
            "style": "primary",
        }],
    }));

    NotificationMessage {
        text: format!("Nuevo ticket {folio} de {}", ctx.requester.display_name()),
        blocks,
    }
}

/// Cuts at `DESCRIPTION_LIMIT` characters, not bytes.
pub fn truncate_description(description: &str) -> String {
    if description.chars().count() > DESCRIPTION_LIMIT {
        let mut shown: String = description.chars().take(DESCRIPTION_LIMIT).collect();
        shown.push_str("...");
        shown
    } else {
        description.to_string()
    }
}

fn escape_mrkdwn(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn mrkdwn(text: String) -> Value {
    json!({ "type": "mrkdwn", "text": text })
}

fn section(text: String) -> Value {
    json!({ "type": "section", "text": mrkdwn(text) })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticket(value: Value) -> Ticket {
        serde_json::from_value(value).unwrap()
    }

    fn block_texts(message: &NotificationMessage) -> Vec<String> {
        message
            .blocks
            .iter()
            .filter_map(|block| block["text"]["text"].as_str().map(str::to_string))
            .collect()
    }

    #[test]
    fn substitutes_custom_template() {
        let t = ticket(json!({ "folio": "T-100" }));
        let requester = Requester {
            name: Some("Ana Ruiz".to_string()),
            email: None,
        };
        let ctx = MessageContext {
            ticket_id: "abc",
            ticket: &t,
            requester: &requester,
            ticket_url: "https://fixify-admin.web.app/tickets/abc",
        };

        let message = build_message(&ctx, Some("Folio {folio} de {solicitante}"));
        assert_eq!(message.text, "Folio T-100 de Ana Ruiz");
        assert_eq!(message.blocks.len(), 1);
        assert_eq!(message.blocks[0]["text"]["text"], "Folio T-100 de Ana Ruiz");
    }

    #[test]
    fn custom_template_covers_every_placeholder() {
        let t = ticket(json!({
            "folio": "T-7",
            "priority": "low",
            "category": "hardware",
            "description": "Pantalla rota",
            "machine": "PC-12",
        }));
        let requester = Requester {
            name: Some("Luis".to_string()),
            email: Some("luis@fixify.com".to_string()),
        };
        let ctx = MessageContext {
            ticket_id: "id7",
            ticket: &t,
            requester: &requester,
            ticket_url: "https://x/tickets/id7",
        };

        let text = render_template(
            "{folio}|{ticketId}|{solicitante}|{email}|{prioridad}|{categoria}|{descripcion}|{maquina}|{elemento}|{url}|{folio}",
            &ctx,
        );
        assert_eq!(
            text,
            "T-7|id7|Luis|luis@fixify.com|🟢 Baja|Hardware|Pantalla rota|PC-12|N/A|https://x/tickets/id7|T-7"
        );
    }

    #[test]
    fn placeholder_text_inside_values_is_not_expanded() {
        let t = ticket(json!({
            "folio": "T-8",
            "description": "Ver {url} y {elemento} en {folio",
        }));
        let requester = Requester {
            name: Some("{email}".to_string()),
            email: Some("ana@fixify.com".to_string()),
        };
        let ctx = MessageContext {
            ticket_id: "t8",
            ticket: &t,
            requester: &requester,
            ticket_url: "https://x/tickets/t8",
        };

        assert_eq!(
            render_template("{solicitante}: {descripcion} <{url}> {otro} {{folio}", &ctx),
            "{email}: Ver {url} y {elemento} en {folio <https://x/tickets/t8> {otro} {T-8"
        );
    }

    #[test]
    fn truncates_long_descriptions() {
        let long = "a".repeat(600);
        let t = ticket(json!({ "folio": "T-1", "description": long }));
        let requester = Requester::default();
        let ctx = MessageContext {
            ticket_id: "t1",
            ticket: &t,
            requester: &requester,
            ticket_url: "https://x/tickets/t1",
        };

        let message = build_message(&ctx, None);
        let description = block_texts(&message)
            .into_iter()
            .find(|text| text.starts_with("*Descripción:*"))
            .unwrap();
        let shown = description.trim_start_matches("*Descripción:*\n");
        assert_eq!(shown, format!("{}...", "a".repeat(500)));
    }

    #[test]
    fn short_descriptions_are_kept_whole() {
        assert_eq!(truncate_description("corto"), "corto");
        let exact = "é".repeat(500);
        assert_eq!(truncate_description(&exact), exact);
    }

    #[test]
    fn default_message_layout() {
        let t = ticket(json!({
            "folio": "T-42",
            "priority": "critical",
            "category": "network",
            "status": "open",
            "elementName": "Router piso 3",
        }));
        let requester = Requester {
            name: Some("Ana Ruiz".to_string()),
            email: Some("ana@fixify.com".to_string()),
        };
        let ctx = MessageContext {
            ticket_id: "t42",
            ticket: &t,
            requester: &requester,
            ticket_url: "https://fixify-admin.web.app/tickets/t42",
        };

        let message = build_message(&ctx, None);
        assert_eq!(message.text, "Nuevo ticket T-42 de Ana Ruiz");
        assert_eq!(message.blocks[0]["type"], "header");
        assert_eq!(message.blocks[0]["text"]["text"], "🎫 Nuevo Ticket: T-42");

        let fields = message.blocks[1]["fields"].as_array().unwrap();
        assert_eq!(
            fields[0]["text"],
            "*Solicitante:*\nAna Ruiz\n<mailto:ana@fixify.com|ana@fixify.com>"
        );
        assert_eq!(fields[1]["text"], "*Prioridad:*\n🔴 Crítica");
        assert_eq!(fields[2]["text"], "*Categoría:*\nRed");
        assert_eq!(fields[3]["text"], "*Estado:*\n🔓 Abierto");

        let texts = block_texts(&message);
        assert!(!texts.iter().any(|text| text.starts_with("*Descripción:*")));
        assert!(!texts.iter().any(|text| text.starts_with("*Máquina:*")));
        assert!(texts.contains(&"*Elemento:* Router piso 3".to_string()));

        let actions = message.blocks.last().unwrap();
        assert_eq!(actions["type"], "actions");
        assert_eq!(
            actions["elements"][0]["url"],
            "https://fixify-admin.web.app/tickets/t42"
        );
    }

    #[test]
    fn employee_overrides_ticket_contact() {
        let t = ticket(json!({
            "contactName": "Contacto",
            "contactEmail": "contacto@fixify.com",
        }));
        let employee = Employee {
            name: Some("Ana Ruiz".to_string()),
            email: None,
        };

        let requester = Requester::resolve(&t, Some(&employee));
        assert_eq!(requester.name.as_deref(), Some("Ana Ruiz"));
        assert_eq!(requester.email.as_deref(), Some("contacto@fixify.com"));

        let plain = Requester::resolve(&t, None);
        assert_eq!(plain.name.as_deref(), Some("Contacto"));
    }
}
