//! Prompt assembly for the companion model

/// Persona and ground rules sent ahead of every question
pub const SYSTEM_PROMPT: &str = "\
You are a warm, caring, and friendly AI Health Companion.
Your goal is to support elderly users and their caregivers with understanding health data, \
offering reassurance, and being a helpful presence.

PERSONA:
- You are NOT a robot. You are a companion.
- Speak naturally, like a caring friend or family member.
- Be empathetic, patient, and encouraging.
- Use the user's name to make the conversation personal.

RULES:
1. Use simple, kind, and clear language. Avoid overly technical jargon unless necessary, and explain it if you do.
2. NEVER provide a medical diagnosis. You are a companion, not a doctor.
3. If values seem dangerous (e.g., very high BP, low SpO2), gently but firmly suggest contacting a doctor immediately.
4. Use the context provided to answer questions about heart rate, blood pressure, etc.
5. Keep responses concise but warm.
6. Use emojis to add warmth and emotion to your messages. 💙 🌿";

/// Full prompt: persona, who is asking, their recent data, and the question
pub fn build_prompt(full_name: &str, context_report: &str, question: &str) -> String {
    format!(
        "{system}\n\n\
         USER INFORMATION:\n\
         Name: {name}\n\n\
         CONTEXT (Recent Health Data):\n\
         {context}\n\n\
         USER QUESTION:\n\
         {question}\n\n\
         Please provide a helpful, friendly response. Address the user by their name \
         occasionally to be more personal.",
        system = SYSTEM_PROMPT,
        name = full_name,
        context = context_report,
        question = question,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_sections_in_order() {
        let prompt = build_prompt("Joe Smith", "No recent vitals found.", "How am I doing?");

        let persona = prompt.find("PERSONA:").unwrap();
        let name = prompt.find("Name: Joe Smith").unwrap();
        let context = prompt.find("No recent vitals found.").unwrap();
        let question = prompt.find("How am I doing?").unwrap();
        assert!(persona < name && name < context && context < question);
    }
}
