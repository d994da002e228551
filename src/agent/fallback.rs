//! Rule-based replies used when no language model is configured or the model
//! call fails.
//!
//! Rules are checked in order and the first match answers. Keywords match the
//! start of a word, so "run" also catches "running". The short tokens in
//! [`WHOLE_WORDS`] would collide with ordinary words ("hi" in "high") and must
//! match a whole word.

use crate::agent::context::VitalContext;
use crate::vitals::VitalKind;
use rand::seq::SliceRandom;
use rand::Rng;

const MANAGEMENT: &[&str] = &[
    "manage", "control", "controll", "reduce", "lower", "improve", "fix", "how to", "what do",
    "what i do", "normalize", "maintain",
];

const BP_WORDS: &[&str] = &["blood pressure", "bp", "pressure"];
const HR_WORDS: &[&str] = &["heart rate", "heart", "hr", "pulse", "heartbeat"];
const GLUCOSE_WORDS: &[&str] = &["glucose", "sugar", "blood sugar", "diabetes"];
const SPO2_WORDS: &[&str] = &["spo2", "oxygen", "o2", "saturation"];
const TEMP_WORDS: &[&str] = &["temperature", "temp", "fever"];

const EXERCISE_WORDS: &[&str] = &["exercise", "excise", "work out", "workout", "walk", "run"];
const DIET_WORDS: &[&str] = &["diet", "food", "eat", "nutrition"];

const ADVICE_WORDS: &[&str] = &[
    "how to", "make it normal", "improve", "fix", "advice", "change", "control", "controll",
    "tips", "tip", "suggestion", "suggestions", "what should i do", "what do i do", "what i do",
    "what can i do", "what i so", "so what i do",
];

const INTERPRET_WORDS: &[&str] = &[
    "good", "bad", "normal", "okay", "fine", "worry", "dangerous", "safe", "indicate", "mean",
];

const OVERVIEW_WORDS: &[&str] = &["vitals", "health", "data", "readings", "condition", "status"];
const CHECK_WORDS: &[&str] = &["my", "is", "value", "check", "about", "tell"];
const GREETINGS: &[&str] = &["hello", "hi", "hey", "good morning", "good afternoon"];

const WHOLE_WORDS: &[&str] = &["hi", "hr", "bp", "my", "is"];

/// Lowercased message split into words, padded for boundary matching
struct Words {
    padded: String,
}

impl Words {
    fn new(message: &str) -> Self {
        let words: Vec<String> = message
            .to_lowercase()
            .split(|c: char| !(c.is_alphanumeric() || c == '\''))
            .filter(|w| !w.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            padded: format!(" {} ", words.join(" ")),
        }
    }

    fn has(&self, keyword: &str) -> bool {
        if WHOLE_WORDS.contains(&keyword) {
            self.padded.contains(&format!(" {} ", keyword))
        } else {
            self.padded.contains(&format!(" {}", keyword))
        }
    }

    fn has_any(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|k| self.has(k))
    }
}

fn pick<R: Rng>(rng: &mut R, options: Vec<String>) -> String {
    options.choose(rng).cloned().unwrap_or_default()
}

/// Answer a message without a model
pub fn respond<R: Rng>(message: &str, context: &VitalContext, name: &str, rng: &mut R) -> String {
    let words = Words::new(message);

    if words.has("how are you") {
        return format!(
            "I'm doing well, thank you for asking, {name}! I'm ready to help you with your health data. How are you feeling today? 💙"
        );
    }

    if words.has_any(&["my name", "who am i", "know me"]) {
        return format!("You are {name}! I'm here to help you stay healthy, {name}. 💙");
    }

    if words.has_any(&["who are you", "who're you", "who'r you", "your name"]) {
        return format!(
            "I am your AI Health Companion, {name}. I'm here to monitor your vitals and answer your health questions. 🤝"
        );
    }

    if let Some(reply) = management_reply(&words, name, rng) {
        return reply;
    }

    if words.has_any(EXERCISE_WORDS) {
        return pick(rng, vec![
            format!("Moving your body is great for you, {name}! 🏃 Simple activities like walking, light stretching, or gardening can be very beneficial. Always check with your doctor before starting a new routine!"),
            "Great question! Many people find that a daily 20-minute walk helps improve heart health and mood. 🌿 Just listen to your body and don't overdo it.".to_string(),
            format!("Regular gentle movement is key, {name}. You don't need to run a marathon, just staying active helps! Ask your doctor what types of exercise are safe for you. 🧘"),
        ]);
    }

    if words.has_any(DIET_WORDS) {
        return pick(rng, vec![
            "They say 'you are what you eat'! 🍎 Generally, a balanced diet with plenty of vegetables, fruits, and whole grains is recommended. But for your specific needs, a nutritionist or your doctor is the best guide.".to_string(),
            format!("Eating well is a huge part of staying healthy, {name}. 🥗 Try to stay hydrated and limit processed foods. Do you have any specific dietary restrictions your doctor mentioned?"),
            "Good nutrition is powerful medicine. 🥕 Focusing on fresh, whole foods is usually a safe bet. However, please consult your doctor for a diet plan that fits your specific health conditions.".to_string(),
        ]);
    }

    if words.has_any(ADVICE_WORDS) {
        return pick(rng, vec![
            format!("That's a good question, {name}. Generally, maintaining a healthy diet, staying hydrated, and regular gentle exercise can help. However, since every person is different, the best way to improve your specific condition is to share these readings with your doctor. 🩺"),
            format!("I love that you're taking charge of your health, {name}! 🌟 Small steps like better sleep, drinking water, and reducing stress make a big difference. Be sure to discuss these results with your doctor for a tailored plan."),
            "Improving your health is a journey! 💙 Focusing on the basics of sleep, hydration, and movement is a great start. But for these specific readings, your doctor's advice is the most important tool you have.".to_string(),
        ]);
    }

    if words.has_any(INTERPRET_WORDS) {
        return if matches!(context, VitalContext::Empty) {
            format!("I can't tell yet, {name}. Please add some health readings first so I can analyze them for you. 📊")
        } else if context.has_abnormal() {
            format!("I see some values that are flagged as abnormal, {name}. It's best not to worry, but you should share these results with your doctor just to be safe. 💙")
        } else if context.has_normal() {
            format!("Yes, {name}! Based on your recent data, everything looks within the normal range. Keep up the good work! 🎉")
        } else {
            format!("I'm not sure, {name}. I don't see enough data to give you a clear answer. Please try adding more readings.")
        };
    }

    if words.has_any(OVERVIEW_WORDS) {
        if !context.has_readings() {
            return format!("I don't see any health data recorded yet, {name}. Would you like to add some vitals? 📊");
        }
        let report = context.report();
        return if context.has_abnormal() {
            format!("Here's your recent health data, {name}:\n\n{report}\n\nI noticed some values are outside the typical range. Please consult with your doctor to understand what this means for you. 💙")
        } else {
            format!("Here's what I found in your recent health data, {name}:\n\n{report}\n\nEverything looks good! Keep monitoring regularly. 💙")
        };
    }

    if let Some(reply) = specific_vital_reply(&words, context, name) {
        return reply;
    }

    if words.has_any(GREETINGS) {
        return format!("Hello {name}! 👋 I'm your AI Health Companion. I can help you understand your health data and answer questions about your vitals. How can I assist you today?");
    }

    if message.contains('?') {
        return format!("That's a great question, {name}! While I can help you understand your health data, I recommend discussing specific medical concerns with your doctor. Is there anything about your recent vitals you'd like me to explain? 💙");
    }

    format!("I'm here to help you understand your health data, {name}! You can ask me about your vitals, or add new readings. What would you like to know? 😊")
}

/// "How do I lower my blood pressure?" style questions
fn management_reply<R: Rng>(words: &Words, name: &str, rng: &mut R) -> Option<String> {
    if !words.has_any(MANAGEMENT) {
        return None;
    }

    if words.has_any(BP_WORDS) {
        return Some(pick(rng, vec![
            format!("Managing blood pressure is very important, {name}. Here are some general tips: reduce salt intake, maintain a healthy weight, exercise regularly (like walking 30 minutes daily), limit alcohol, and manage stress. However, please discuss your specific readings with your doctor for personalized advice! 🩺"),
            "Good question about blood pressure control! Generally: eat more fruits and vegetables, reduce sodium, stay active, and avoid smoking. If your readings show some abnormality, it's crucial to consult your doctor for a proper treatment plan. 💙".to_string(),
            "Blood pressure management typically involves lifestyle changes like eating less salt, exercising regularly, maintaining healthy weight, and reducing stress. Some people also need medication. Please talk to your doctor about the best approach for your specific situation! 🏥".to_string(),
        ]));
    }

    if words.has_any(HR_WORDS) {
        return Some(pick(rng, vec![
            format!("To maintain a healthy heart rate, {name}: stay physically active with regular cardio exercise, manage stress through relaxation techniques, get adequate sleep (7-9 hours), limit caffeine and alcohol, and stay hydrated. If your heart rate is consistently abnormal, please see your doctor! ❤️"),
            "Heart rate management involves regular exercise (which actually strengthens your heart over time), stress reduction, avoiding excessive caffeine, and maintaining good sleep habits. For persistent issues, your doctor might recommend specific treatments. 💓".to_string(),
            "Good question! A healthy heart rate comes from: regular physical activity, stress management, proper hydration, limiting stimulants like caffeine, and getting enough rest. Always consult your doctor if you notice irregular patterns! 🫀".to_string(),
        ]));
    }

    if words.has_any(GLUCOSE_WORDS) {
        return Some(pick(rng, vec![
            format!("Managing blood glucose is crucial, {name}. Key strategies: eat balanced meals with complex carbs and fiber, exercise regularly, maintain healthy weight, monitor your levels as advised, limit sugary foods and drinks, and take medications as prescribed. Your doctor can create a personalized plan! 🩸"),
            "Blood sugar control involves: eating at regular intervals, choosing whole grains over refined carbs, including protein and healthy fats in meals, staying active, managing stress, and monitoring your levels. Please work with your doctor for specific targets! 📊".to_string(),
            "Great question about glucose management! Focus on: balanced diet with low glycemic foods, regular physical activity, weight management, stress reduction, and consistent meal timing. If you have diabetes, follow your doctor's medication and monitoring plan closely. 🍎".to_string(),
        ]));
    }

    if words.has_any(SPO2_WORDS) {
        return Some(pick(rng, vec![
            format!("To maintain healthy oxygen levels, {name}: practice deep breathing exercises, stay physically active to strengthen lungs, maintain good posture, ensure good air quality in your home, and avoid smoking. If levels are consistently low, see your doctor immediately! 🫁"),
            "Oxygen saturation can be improved through: regular breathing exercises, cardiovascular exercise, maintaining healthy weight, good posture, and avoiding pollutants. Low SpO2 can be serious, so always consult your doctor if readings are below 95%! 💨".to_string(),
            "Good question! Supporting healthy oxygen levels: do breathing exercises, stay active, keep airways clear, maintain good indoor air quality, and avoid smoking. Persistent low readings need immediate medical attention! 🌬️".to_string(),
        ]));
    }

    if words.has_any(TEMP_WORDS) {
        return Some(pick(rng, vec![
            format!("For managing fever or temperature, {name}: stay hydrated, rest adequately, use cool compresses if needed, dress in light clothing, and monitor your temperature regularly. For fever above 100.4°F or lasting more than 3 days, contact your doctor! 🌡️"),
            "Temperature management tips: drink plenty of fluids, get rest, take fever-reducing medication if recommended by your doctor, use lukewarm baths (not cold), and monitor regularly. Seek medical help for high or persistent fever! 🏥".to_string(),
            "To manage body temperature: stay hydrated, rest in a cool environment, use appropriate clothing, and monitor regularly. For fever, you can use over-the-counter fever reducers (as directed), but always consult your doctor for persistent or high fever! 💊".to_string(),
        ]));
    }

    None
}

/// Questions about one vital: the latest value when asked about "my" reading,
/// otherwise a short explanation of the normal range
fn specific_vital_reply(words: &Words, context: &VitalContext, name: &str) -> Option<String> {
    let checking = words.has_any(CHECK_WORDS);

    if words.has_any(&["heart", "hr", "pulse"]) {
        if !checking {
            return Some("Your heart rate is an important indicator of cardiovascular health. Normal resting heart rate is typically 60-100 bpm. If you notice anything unusual, please consult your doctor. ❤️".to_string());
        }
        return Some(match context.latest_value(&VitalKind::HeartRate) {
            Some(val) => format!("Your latest heart rate reading was {val}. Normal resting heart rate is typically 60-100 bpm. ❤️"),
            None => format!("I don't see a recent heart rate reading in your data, {name}. Please add one! 💓"),
        });
    }

    if words.has_any(&["blood pressure", "bp"]) {
        if !checking {
            return Some("Blood pressure is measured as systolic/diastolic (e.g., 120/80). Normal is typically below 120/80. High blood pressure should be monitored by a healthcare professional. 🩺".to_string());
        }
        let sys = context.latest_value(&VitalKind::BloodPressureSys);
        let dia = context.latest_value(&VitalKind::BloodPressureDia);
        return Some(match (sys, dia) {
            (Some(sys), Some(dia)) => format!("Your latest blood pressure was {sys} (systolic) / {dia} (diastolic). Normal is typically below 120/80. 🩺"),
            _ => format!("I don't see a full blood pressure reading recently, {name}. Please update your vitals! 🩺"),
        });
    }

    if words.has_any(&["oxygen", "spo2"]) {
        if !checking {
            return Some("Blood oxygen (SpO2) should typically be 95-100%. Levels below 95% may need medical attention. Make sure to measure it properly! 🫁".to_string());
        }
        return Some(match context.latest_value(&VitalKind::Spo2) {
            Some(val) => format!("Your latest SpO2 reading was {val}. Levels below 95% may need medical attention. 🫁"),
            None => format!("I don't see a recent SpO2 reading, {name}. 🫁"),
        });
    }

    if words.has_any(&["glucose", "sugar", "diabetes"]) {
        if !checking {
            return Some("Normal fasting glucose is 70-100 mg/dL. After meals, it can go up to 140 mg/dL. If you have diabetes, follow your doctor's guidance on target ranges. 🩸".to_string());
        }
        return Some(match context.latest_value(&VitalKind::Glucose) {
            Some(val) => format!("Your latest glucose reading was {val}. Normal fasting glucose is 70-100 mg/dL. 🩸"),
            None => format!("I don't see a recent glucose reading, {name}. 🩸"),
        });
    }

    if words.has_any(&["temperature", "fever"]) {
        if !checking {
            return Some("Normal body temperature is around 98.6°F (37°C). A fever is generally 100.4°F or higher. If you have a persistent fever, contact your doctor. 🌡️".to_string());
        }
        return Some(match context.latest_value(&VitalKind::Temperature) {
            Some(val) => format!("Your latest temperature was {val}. Normal body temperature is around 98.6°F. 🌡️"),
            None => format!("I don't see a recent temperature reading, {name}. 🌡️"),
        });
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::Vital;
    use chrono::Utc;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn vital(kind: &str, value: f64, unit: &str, abnormal: bool) -> Vital {
        Vital {
            id: 1,
            user_id: 1,
            timestamp: Utc::now(),
            vital_type: kind.to_string(),
            value,
            unit: unit.to_string(),
            is_abnormal: abnormal,
        }
    }

    fn ask(message: &str, context: &VitalContext) -> String {
        respond(message, context, "Joe Smith", &mut rng())
    }

    #[test]
    fn test_word_matching() {
        let words = Words::new("Is this high? I'm exercising!");
        assert!(!words.has("hi"));
        assert!(words.has("exercis"));
        assert!(words.has("is"));
        assert!(Words::new("Hi there").has("hi"));
        assert!(!Words::new("this").has("is"));
        assert!(Words::new("tips please").has("tip"));
    }

    #[test]
    fn test_inflected_keywords_still_match() {
        let ctx = VitalContext::Empty;

        let exercise = ask("Is running ok for me?", &ctx);
        assert!(
            ["Moving your body", "20-minute walk", "gentle movement"]
                .iter()
                .any(|m| exercise.contains(m)),
            "{exercise}"
        );

        let diet = ask("What about eating eggs", &ctx);
        assert!(
            ["what you eat", "Eating well", "Good nutrition"]
                .iter()
                .any(|m| diet.contains(m)),
            "{diet}"
        );
    }

    #[test]
    fn test_small_talk() {
        let ctx = VitalContext::Empty;
        assert!(ask("How are you?", &ctx).starts_with("I'm doing well"));
        assert_eq!(
            ask("Do you know me?", &ctx),
            "You are Joe Smith! I'm here to help you stay healthy, Joe Smith. 💙"
        );
        assert!(ask("Who are you", &ctx).starts_with("I am your AI Health Companion"));
        assert!(ask("hello", &ctx).starts_with("Hello Joe Smith!"));
    }

    #[test]
    fn test_management_question_routes_by_vital() {
        let ctx = VitalContext::Empty;
        let bp = ask("How can I lower my blood pressure?", &ctx);
        assert!(bp.to_lowercase().contains("blood pressure"));

        let glucose = ask("how to control my sugar", &ctx);
        assert!(glucose.to_lowercase().contains("glucose") || glucose.contains("sugar"));
    }

    #[test]
    fn test_interpretation_depends_on_context() {
        assert!(ask("Is this normal?", &VitalContext::Empty).starts_with("I can't tell yet"));
        assert_eq!(
            ask("Is this normal?", &VitalContext::UserNotFound),
            "I'm not sure, Joe Smith. I don't see enough data to give you a clear answer. Please try adding more readings."
        );

        let abnormal = VitalContext::from_recent(vec![vital("heart_rate", 130.0, "bpm", true)]);
        assert!(ask("Is this normal?", &abnormal).contains("flagged as abnormal"));

        let fine = VitalContext::from_recent(vec![vital("heart_rate", 70.0, "bpm", false)]);
        assert!(ask("Is this normal?", &fine).starts_with("Yes, Joe Smith!"));
    }

    #[test]
    fn test_overview_includes_report() {
        let ctx = VitalContext::from_recent(vec![vital("spo2", 97.0, "%", false)]);
        let reply = ask("Show me my vitals", &ctx);
        assert!(reply.contains("spo2 = 97.0 %"));
        assert!(reply.contains("Everything looks good"));
    }

    #[test]
    fn test_latest_value_lookup() {
        let ctx = VitalContext::from_recent(vec![
            vital("blood_pressure_sys", 130.0, "mmHg", false),
            vital("blood_pressure_dia", 85.0, "mmHg", false),
            vital("heart_rate", 72.0, "bpm", false),
        ]);
        assert_eq!(
            ask("what was my pulse", &ctx),
            "Your latest heart rate reading was 72.0 bpm. Normal resting heart rate is typically 60-100 bpm. ❤️"
        );
        assert!(ask("tell me my bp", &ctx).contains("130.0 mmHg (systolic) / 85.0 mmHg (diastolic)"));
        assert!(ask("my fever", &VitalContext::Empty).starts_with("I don't see a recent temperature"));
    }

    #[test]
    fn test_generic_question_and_default() {
        let ctx = VitalContext::Empty;
        assert!(ask("Should I call someone?", &ctx).starts_with("That's a great question"));
        assert!(ask("thanks", &ctx).starts_with("I'm here to help"));
    }
}
