use handlebars::Handlebars;
use std::sync::Arc;

pub type Hbs = Arc<Handlebars<'static>>;

pub const ALERT_CREATED: &str = "emails/alert_created";
pub const ALERT_TRIGGERED: &str = "emails/alert_triggered";

const ALERT_CREATED_HBS: &str = r#"<div style="font-family: sans-serif; max-width: 560px">
  <h2>Your alert is set</h2>
  <p>Hi {{name}},</p>
  <p>We will email you when <strong>{{fund_name}}</strong> meets your {{alert_type}} condition:
     <strong>{{comparison}} {{value}}</strong>.</p>
  <p style="color: #888; font-size: 12px">You can pause or delete this alert at any time.</p>
</div>"#;

const ALERT_TRIGGERED_HBS: &str = r#"<div style="font-family: sans-serif; max-width: 560px">
  <h2>Alert triggered</h2>
  <p>Hi {{name}},</p>
  <p>Your {{alert_type}} alert for <strong>{{fund_name}}</strong> has fired:
     <strong>{{comparison}} {{value}}</strong>.</p>
  {{#if observed}}<p>Current {{observed_label}}: <strong>{{observed}}</strong></p>{{/if}}
</div>"#;

pub fn build_handlebars() -> Result<Hbs, handlebars::TemplateError> {
    let mut hb = Handlebars::new();

    hb.register_template_string(ALERT_CREATED, ALERT_CREATED_HBS)?;
    hb.register_template_string(ALERT_TRIGGERED, ALERT_TRIGGERED_HBS)?;

    Ok(Arc::new(hb))
}
