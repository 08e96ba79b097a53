use shared_models::clinic::Condition;

const DIABETES_POSITIVE: &[&str] = &[
    "Consult an endocrinologist or diabetologist immediately",
    "Get HbA1c and fasting blood sugar tests done",
    "Monitor blood glucose levels regularly",
    "Follow a balanced diet with controlled carbohydrates",
    "Regular physical activity (30 minutes daily)",
    "Maintain healthy body weight",
    "Stay hydrated and avoid sugary drinks",
];

const DIABETES_NEGATIVE: &[&str] = &[
    "Maintain a healthy lifestyle to prevent diabetes",
    "Regular health checkups annually",
    "Balanced diet with plenty of vegetables and fruits",
    "Regular exercise (at least 150 minutes per week)",
    "Maintain healthy body weight",
    "Limit sugar and processed food intake",
];

const HEART_POSITIVE: &[&str] = &[
    "Consult a cardiologist urgently",
    "Get ECG, Echo, and cardiac enzyme tests",
    "Monitor blood pressure daily",
    "Take prescribed medications regularly",
    "Reduce salt and fatty food intake",
    "Quit smoking and limit alcohol",
    "Manage stress through relaxation techniques",
    "Regular moderate exercise as advised by doctor",
];

const HEART_NEGATIVE: &[&str] = &[
    "Maintain heart-healthy lifestyle",
    "Regular cardiovascular checkups",
    "Balanced diet rich in omega-3 fatty acids",
    "Regular aerobic exercise",
    "Maintain healthy blood pressure and cholesterol",
    "Avoid smoking and excessive alcohol",
    "Manage stress effectively",
];

const LIVER_POSITIVE: &[&str] = &[
    "Consult a hepatologist or gastroenterologist",
    "Get liver function tests (LFT) done",
    "Ultrasound or CT scan of liver may be required",
    "Avoid alcohol completely",
    "Maintain healthy diet with limited fats",
    "Stay hydrated",
    "Avoid unnecessary medications",
    "Get vaccinated for Hepatitis A and B",
];

const LIVER_NEGATIVE: &[&str] = &[
    "Maintain liver health through healthy lifestyle",
    "Limit alcohol consumption",
    "Balanced diet with adequate protein",
    "Regular exercise",
    "Avoid unnecessary medications",
    "Stay hydrated",
    "Get vaccinated for Hepatitis if not done",
];

const KIDNEY_POSITIVE: &[&str] = &[
    "Consult a nephrologist immediately",
    "Get kidney function tests (creatinine, BUN, GFR)",
    "Ultrasound of kidneys may be required",
    "Monitor blood pressure regularly",
    "Control diabetes if present",
    "Limit salt and protein intake as advised",
    "Stay well hydrated",
    "Avoid NSAIDs and nephrotoxic drugs",
];

const KIDNEY_NEGATIVE: &[&str] = &[
    "Maintain kidney health through healthy habits",
    "Drink adequate water daily (8-10 glasses)",
    "Regular exercise",
    "Maintain healthy blood pressure",
    "Control blood sugar if diabetic",
    "Limit salt intake",
    "Avoid excessive protein supplements",
];

pub fn recommendations(condition: Condition, positive: bool) -> &'static [&'static str] {
    match (condition, positive) {
        (Condition::Diabetes, true) => DIABETES_POSITIVE,
        (Condition::Diabetes, false) => DIABETES_NEGATIVE,
        (Condition::Heart, true) => HEART_POSITIVE,
        (Condition::Heart, false) => HEART_NEGATIVE,
        (Condition::Liver, true) => LIVER_POSITIVE,
        (Condition::Liver, false) => LIVER_NEGATIVE,
        (Condition::Kidney, true) => KIDNEY_POSITIVE,
        (Condition::Kidney, false) => KIDNEY_NEGATIVE,
    }
}
