use crate::models::{
    display_date, display_time, ApprovalNotice, BookingNotice, EmailMessage, RejectionNotice,
};

pub const PLAIN_TEXT_FALLBACK: &str = "This email contains rich formatting. \
Please view it in an HTML-capable email client.";

const BOOKED_COLOR: &str = "#3498db";
const CONFIRMED_COLOR: &str = "#27ae60";
const REJECTED_COLOR: &str = "#e74c3c";

/// Clinic branding shared by every template.
#[derive(Debug, Clone)]
pub struct ClinicBranding {
    pub hospital_name: String,
    pub hospital_phone: String,
    pub hospital_address: String,
}

impl ClinicBranding {
    fn footer_html(&self) -> String {
        format!(
            r#"<div style="text-align:center;color:#7f8c8d;font-size:13px;margin-top:20px;line-height:1.4">
    <div>{} &bull; {}</div>
    <div>{}</div>
</div>"#,
            escape(&self.hospital_name),
            escape(&self.hospital_phone),
            escape(&self.hospital_address)
        )
    }

    fn frame_html(&self, title: &str, header_color: &str, inner_html: &str) -> String {
        format!(
            r#"<html>
<head>
    <meta charset="utf-8" />
    <meta name="viewport" content="width=device-width, initial-scale=1" />
</head>
<body style="margin:0;padding:0;background:#f6f8fb;font-family:Arial,Helvetica,sans-serif;">
    <div style="max-width:640px;margin:0 auto;padding:16px;">
        <div style="background:{color};color:#fff;padding:18px 20px;border-radius:12px 12px 0 0;text-align:center;">
            <div style="font-size:20px;font-weight:700;margin:0;">{title}</div>
        </div>
        <div style="background:#ffffff;padding:20px;border-radius:0 0 12px 12px;border:1px solid #eaecef;border-top:none;">
            {inner}
            {footer}
        </div>
    </div>
</body>
</html>"#,
            color = header_color,
            title = title,
            inner = inner_html,
            footer = self.footer_html()
        )
    }

    pub fn booking(&self, notice: &BookingNotice) -> EmailMessage {
        let doctor = escape(&notice.doctor_name);
        let content = format!(
            r#"<p style="margin:0 0 12px 0;font-size:15px;color:#2c3e50;">Dear <strong>{patient}</strong>,</p>
<p style="margin:0 0 10px 0;font-size:15px;color:#2c3e50;">
    Your appointment request has been received and is <strong>pending confirmation</strong> from <strong>{doctor}</strong>.
</p>
<div style="margin:14px 0;padding:12px 14px;border-left:4px solid {color};background:#f1f8ff;border-radius:6px;color:#1f2d3d;">
    <div><strong>Date:</strong> {date}</div>
    <div><strong>Time:</strong> {time}</div>
    <div><strong>Doctor:</strong> {doctor}</div>
</div>
<p style="margin:10px 0 0 0;font-size:14px;color:#2c3e50;">
    We will notify you as soon as the doctor approves or suggests a new time.
</p>"#,
            patient = escape(&notice.patient_name),
            doctor = doctor,
            color = BOOKED_COLOR,
            date = display_date(notice.appointment_date),
            time = display_time(notice.appointment_time),
        );

        EmailMessage {
            to: notice.patient_email.clone(),
            subject: format!("📅 Appointment Booked - {}", self.hospital_name),
            html: self.frame_html("📅 Appointment Booked", BOOKED_COLOR, &content),
        }
    }

    pub fn confirmation(&self, notice: &ApprovalNotice) -> EmailMessage {
        let content = format!(
            r#"<p style="margin:0 0 12px 0;font-size:15px;color:#2c3e50;">Dear <strong>{patient}</strong>,</p>
<p style="margin:0 0 10px 0;font-size:15px;color:#2c3e50;">
    Your appointment has been <strong>confirmed</strong> with <strong>{doctor}</strong> ({specialization}).
</p>
<div style="margin:14px 0;padding:12px 14px;border-left:4px solid {color};background:#eefaf2;border-radius:6px;color:#1f2d3d;">
    <div><strong>Date:</strong> {date}</div>
    <div><strong>Time:</strong> {time}</div>
</div>
<p style="margin:10px 0 0 0;font-size:14px;color:#2c3e50;">
    Please arrive 15 minutes early and carry any previous reports.
</p>"#,
            patient = escape(&notice.patient_name),
            doctor = escape(&notice.doctor_name),
            specialization = escape(&notice.specialization),
            color = CONFIRMED_COLOR,
            date = display_date(notice.appointment_date),
            time = display_time(notice.appointment_time),
        );

        EmailMessage {
            to: notice.patient_email.clone(),
            subject: format!("✅ Appointment Confirmed - {}", self.hospital_name),
            html: self.frame_html("✅ Appointment Confirmed", CONFIRMED_COLOR, &content),
        }
    }

    pub fn rejection(&self, notice: &RejectionNotice) -> EmailMessage {
        let reason_html = notice
            .reason
            .as_deref()
            .filter(|reason| !reason.trim().is_empty())
            .map(|reason| format!("<div><strong>Reason:</strong> {}</div>", escape(reason)))
            .unwrap_or_default();

        let content = format!(
            r#"<p style="margin:0 0 12px 0;font-size:15px;color:#2c3e50;">Dear <strong>{patient}</strong>,</p>
<p style="margin:0 0 10px 0;font-size:15px;color:#2c3e50;">
    We regret to inform you that your appointment with <strong>{doctor}</strong> was <strong>declined</strong>.
</p>
<div style="margin:14px 0;padding:12px 14px;border-left:4px solid {color};background:#fff2f2;border-radius:6px;color:#1f2d3d;">
    <div><strong>Date:</strong> {date}</div>
    <div><strong>Time:</strong> {time}</div>
    {reason}
</div>
<p style="margin:10px 0 0 0;font-size:14px;color:#2c3e50;">
    You may book another slot or contact our support for assistance.
</p>"#,
            patient = escape(&notice.patient_name),
            doctor = escape(&notice.doctor_name),
            color = REJECTED_COLOR,
            date = display_date(notice.appointment_date),
            time = display_time(notice.appointment_time),
            reason = reason_html,
        );

        EmailMessage {
            to: notice.patient_email.clone(),
            subject: format!("⚠️ Appointment Update - {}", self.hospital_name),
            html: self.frame_html("⚠️ Appointment Rejected", REJECTED_COLOR, &content),
        }
    }
}

/// Minimal HTML escaping for user-supplied text placed into templates.
fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
