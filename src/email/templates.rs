use askama::Template;

#[derive(Template)]
#[template(path = "emails/password_reset.html")]
struct PasswordResetEmail<'a> {
    name: &'a str,
    reset_url: &'a str,
    valid_days: i64,
}

#[derive(Template)]
#[template(path = "emails/set_password.html")]
struct SetPasswordEmail<'a> {
    name: &'a str,
    set_password_url: &'a str,
    valid_days: i64,
}

#[derive(Template)]
#[template(path = "emails/lead_assigned.html")]
struct LeadAssignedEmail<'a> {
    name: &'a str,
    title: &'a str,
    company_name: &'a str,
    lead_url: &'a str,
}

#[derive(Template)]
#[template(path = "emails/follow_up_reminder.html")]
struct FollowUpReminderEmail<'a> {
    name: &'a str,
    title: &'a str,
    follow_up_at: &'a str,
    offset_label: &'a str,
    lead_url: &'a str,
}

fn render(template: &impl Template) -> Result<String, String> {
    template
        .render()
        .map_err(|e| format!("Failed to render email: {e}"))
}

pub fn render_password_reset(name: &str, reset_url: &str, valid_days: i64) -> Result<String, String> {
    render(&PasswordResetEmail {
        name,
        reset_url,
        valid_days,
    })
}

pub fn render_set_password(
    name: &str,
    set_password_url: &str,
    valid_days: i64,
) -> Result<String, String> {
    render(&SetPasswordEmail {
        name,
        set_password_url,
        valid_days,
    })
}

pub fn render_lead_assigned(
    name: &str,
    title: &str,
    company_name: &str,
    lead_url: &str,
) -> Result<String, String> {
    render(&LeadAssignedEmail {
        name,
        title,
        company_name,
        lead_url,
    })
}

pub fn render_follow_up_reminder(
    name: &str,
    title: &str,
    follow_up_at: &str,
    offset_label: &str,
    lead_url: &str,
) -> Result<String, String> {
    render(&FollowUpReminderEmail {
        name,
        title,
        follow_up_at,
        offset_label,
        lead_url,
    })
}
