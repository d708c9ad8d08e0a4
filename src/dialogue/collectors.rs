//! Step collectors: pull structured answers out of one utterance.
//!
//! Every collector has the shape `fn(&str, &mut CollectedData)` and only ever
//! writes into the collected-data record. Extraction is regex based and
//! deliberately conservative: when nothing matches, nothing is written, and
//! the step's transition decides whether to route to a clarification step.

use once_cell::sync::Lazy;
use regex::Regex;

use super::state::{push_unique, Activity, CollectedData, Gpa};

/// Longest passion statement kept verbatim, in characters.
pub const PASSION_MAX_CHARS: usize = 200;

fn re(pattern: &str) -> Regex {
    Regex::new(pattern).expect("collector regex must compile")
}

static ANXIOUS_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(anxious|worried|scared|nervous)\b"));
static EXCITED_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(excited|pumped|can'?t wait|looking forward)\b"));

static IMMIGRANT_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)(immigra|born in|moved from|parents (are )?from)"));
static FIRST_GEN_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)(first.gen|first generation|parents didn'?t go)"));
static LGBTQ_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(lgbtq\+?|gay|queer|trans|bi)\b"));
static FAMILY_PRESSURE_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)(family pressure|parents want|expected to)"));

static JUNIOR_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(junior|11th)\b"));
static SENIOR_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(senior|12th)\b"));
static SOPHOMORE_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(sophomore|10th)\b"));
static FRESHMAN_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(freshman|9th)\b"));
static COMPETITIVE_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(competitive|pressure|intense)\b"));

static GPA_RE: Lazy<Regex> = Lazy::new(|| re(r"\d\.\d+"));

static AP_RE: Lazy<Regex> = Lazy::new(|| re(r"\bAP\b"));
static AP_COURSE_RE: Lazy<Regex> = Lazy::new(|| re(r"\bAP\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?"));
static IB_HONORS_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(IB|honors)\b"));

static CLAUSE_SPLIT_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)[.,;!?]|\bbut\b|\bwhile\b"));
static LIKES_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(love|enjoy|favou?rite|passionate about|really into)\b"));
static DISLIKES_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(struggle|hate|weak|not great at|terrible at)\b"));

static DEPTH_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(years|since freshman|founded|president|captain)\b"));
static LEADERSHIP_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(president|captain|founder|founded|lead|leader|editor|chair)\b"));
static YEARS_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,2})\s+years?\b"));
static HOURS_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(\d{1,2})\s*(?:hours?|hrs?)\b"));

static COMPETITION_LEVEL_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(international|national|state|regional)\b"));
static ACADEMIC_AWARD_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(honor roll|ap scholar|national merit|valedictorian|dean'?s list)\b"));

static SERVICE_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(volunteer\w*|community|help\w*|service|giving back)\b"));
static FAMILY_FINANCE_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(family|parents?|financial|money)\b"));
static IDENTITY_CHALLENGE_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(identity|belong\w*|fit in|discrimination)\b"));
static RED_FLAG_RE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(suspended|suspension|expelled|academic probation|disciplinary|failed a class)\b")
});
static CURIOSITY_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(read|books?|podcasts?|research|learn\w*|curious)\b"));

static AFFIRM_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(yeah|yes|totally|exactly|that'?s right)\b"));
static RESONATES_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(yes|resonates|feels right|that'?s me)\b"));
static LEGACY_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(legacy|family)\b"));
static OVERCOMING_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(overc\w+|struggl\w+|hard time|survived)\b"));
static BUILDING_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(built|build\w*|started|founded|created|made)\b"));

static CONCERN_RE: Lazy<Regex> = Lazy::new(|| re(r"(?i)\b(worried|nervous|scared|concerned)\b"));
static DEAL_BREAKER_RE: Lazy<Regex> = Lazy::new(|| {
    re(r"(?i)\b(?:no|not|don'?t want|never)\b[^.!?]*?\b(cold|big|huge|small|city|rural|far)\b")
});
static SETTING_RE: Lazy<Regex> =
    Lazy::new(|| re(r"(?i)\b(small|large|urban|rural|liberal arts|research|stem)\b"));

const SUBJECTS: &[(&str, &str)] = &[
    ("computer science", "Computer Science"),
    ("comp sci", "Computer Science"),
    ("math", "Math"),
    ("calculus", "Math"),
    ("statistics", "Statistics"),
    ("biology", "Biology"),
    ("bio", "Biology"),
    ("chemistry", "Chemistry"),
    ("chem", "Chemistry"),
    ("physics", "Physics"),
    ("english", "English"),
    ("literature", "English"),
    ("writing", "English"),
    ("history", "History"),
    ("government", "Government"),
    ("economics", "Economics"),
    ("psychology", "Psychology"),
    ("spanish", "Spanish"),
    ("french", "French"),
    ("chinese", "Chinese"),
    ("art", "Art"),
    ("music", "Music"),
];

const ACTIVITIES: &[(&str, &str)] = &[
    ("debate", "Debate"),
    ("model un", "Model UN"),
    ("robotics", "Robotics"),
    ("science olympiad", "Science Olympiad"),
    ("math team", "Math Team"),
    ("student government", "Student Government"),
    ("newspaper", "School Newspaper"),
    ("yearbook", "Yearbook"),
    ("band", "Band"),
    ("orchestra", "Orchestra"),
    ("choir", "Choir"),
    ("theater", "Theater"),
    ("theatre", "Theater"),
    ("soccer", "Soccer"),
    ("basketball", "Basketball"),
    ("football", "Football"),
    ("swim", "Swimming"),
    ("track", "Track"),
    ("tennis", "Tennis"),
    ("volunteer", "Volunteering"),
    ("tutoring", "Tutoring"),
    ("research", "Research"),
    ("part-time job", "Part-time Job"),
    ("hackathon", "Hackathons"),
];

const COLLEGES: &[(&str, &str)] = &[
    ("stanford", "Stanford"),
    ("harvard", "Harvard"),
    ("mit", "MIT"),
    ("yale", "Yale"),
    ("princeton", "Princeton"),
    ("columbia", "Columbia"),
    ("penn", "Penn"),
    ("brown", "Brown"),
    ("cornell", "Cornell"),
    ("dartmouth", "Dartmouth"),
    ("berkeley", "UC Berkeley"),
    ("ucla", "UCLA"),
    ("duke", "Duke"),
    ("northwestern", "Northwestern"),
    ("uchicago", "UChicago"),
];

/// Canonical names of every table entry whose key appears as a whole word.
fn find_terms(text: &str, table: &[(&str, &'static str)]) -> Vec<&'static str> {
    let lower = text.to_lowercase();
    let mut found: Vec<&'static str> = Vec::new();
    for (needle, canonical) in table {
        if contains_word(&lower, needle) && !found.contains(canonical) {
            found.push(canonical);
        }
    }
    found
}

fn contains_word(haystack: &str, needle: &str) -> bool {
    haystack.match_indices(needle).any(|(start, _)| {
        let end = start + needle.len();
        let before = haystack[..start].chars().next_back();
        let after = haystack[end..].chars().next();
        !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
    })
}

// ---------------------------------------------------------------------------
// Warmup
// ---------------------------------------------------------------------------

pub fn collect_intro(msg: &str, data: &mut CollectedData) {
    let personality = data.personality();
    if ANXIOUS_RE.is_match(msg) {
        push_unique(&mut personality.fears, "anxious about college process");
    }
    if EXCITED_RE.is_match(msg) {
        push_unique(&mut personality.excitements, "excited about college");
    }
}

pub fn collect_background(msg: &str, data: &mut CollectedData) {
    let personality = data.personality();
    if IMMIGRANT_RE.is_match(msg) {
        push_unique(&mut personality.background, "immigrant background");
    }
    if FIRST_GEN_RE.is_match(msg) {
        push_unique(&mut personality.background, "first-generation college");
    }
    if LGBTQ_RE.is_match(msg) {
        push_unique(&mut personality.identity, "LGBTQ+");
    }
}

pub fn collect_background_probe(msg: &str, data: &mut CollectedData) {
    collect_background(msg, data);
    if FAMILY_PRESSURE_RE.is_match(msg) {
        push_unique(&mut data.personality().background, "family pressure on college");
    }
}

fn grade_level(msg: &str) -> Option<(&'static str, Option<&'static str>)> {
    if SENIOR_RE.is_match(msg) {
        Some(("senior", Some("senior year applications")))
    } else if JUNIOR_RE.is_match(msg) {
        Some(("junior", Some("junior year stress")))
    } else if SOPHOMORE_RE.is_match(msg) {
        Some(("sophomore", None))
    } else if FRESHMAN_RE.is_match(msg) {
        Some(("freshman", None))
    } else {
        None
    }
}

pub fn collect_school_context(msg: &str, data: &mut CollectedData) {
    let academics = data.academics();
    if let Some((grade, challenge)) = grade_level(msg) {
        academics.grade_level = Some(grade.to_string());
        if let Some(challenge) = challenge {
            push_unique(&mut academics.academic_challenges, challenge);
        }
    }
    if COMPETITIVE_RE.is_match(msg) {
        push_unique(
            &mut academics.academic_challenges,
            "competitive school environment",
        );
    }
}

// ---------------------------------------------------------------------------
// Diagnostic
// ---------------------------------------------------------------------------

fn gpa_values(msg: &str) -> Vec<f64> {
    GPA_RE
        .find_iter(msg)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .filter(|v| *v > 0.0 && *v <= 5.0)
        .collect()
}

/// First GPA-looking number is unweighted, the second (if any) weighted.
pub fn collect_gpa(msg: &str, data: &mut CollectedData) {
    let values = gpa_values(msg);
    let gpa = data.academics().gpa.get_or_insert_with(Gpa::default);
    if let Some(first) = values.first() {
        gpa.unweighted = Some(*first);
    }
    if let Some(second) = values.get(1) {
        gpa.weighted = Some(*second);
    }
}

pub fn collect_gpa_clarify(msg: &str, data: &mut CollectedData) {
    let values = gpa_values(msg);
    let gpa = data.academics().gpa.get_or_insert_with(Gpa::default);
    if let Some(first) = values.first() {
        gpa.unweighted = Some(*first);
    }
}

/// AP count: five or more is "high", three or four "medium", else "moderate".
pub fn collect_rigor(msg: &str, data: &mut CollectedData) {
    let academics = data.academics();
    let ap_count = AP_RE.find_iter(msg).count();
    if ap_count > 0 {
        let level = match ap_count {
            n if n >= 5 => "high",
            n if n >= 3 => "medium",
            _ => "moderate",
        };
        academics.rigor_level = Some(level.to_string());
    } else if IB_HONORS_RE.is_match(msg) {
        academics.rigor_level = Some("moderate".to_string());
    }
    for course in AP_COURSE_RE.find_iter(msg) {
        push_unique(&mut academics.ap_courses, course.as_str());
    }
}

/// Subjects are attributed per clause, so "love bio but hate chem" splits
/// cleanly into one favorite and one weak subject.
pub fn collect_favorites(msg: &str, data: &mut CollectedData) {
    let academics = data.academics();
    for clause in CLAUSE_SPLIT_RE.split(msg) {
        let subjects = find_terms(clause, SUBJECTS);
        if subjects.is_empty() {
            continue;
        }
        if DISLIKES_RE.is_match(clause) {
            for subject in subjects {
                push_unique(&mut academics.weak_subjects, subject);
            }
        } else if LIKES_RE.is_match(clause) {
            for subject in subjects {
                push_unique(&mut academics.favorite_subjects, subject);
            }
        }
    }
}

pub fn collect_ecs_overview(msg: &str, data: &mut CollectedData) {
    let ecs = data.ecs();
    for name in find_terms(msg, ACTIVITIES) {
        if !ecs.activities.iter().any(|a| a.name == name) {
            ecs.activities.push(Activity {
                name: name.to_string(),
                ..Activity::default()
            });
        }
    }
    let depth = match ecs.activities.len() {
        0 => None,
        1..=2 => Some("deep specialist"),
        3..=5 => Some("well-rounded"),
        _ => Some("scattered"),
    };
    if let Some(depth) = depth {
        ecs.depth = Some(depth.to_string());
    }
}

pub fn collect_ecs_depth(msg: &str, data: &mut CollectedData) {
    let ecs = data.ecs();
    if DEPTH_RE.is_match(msg) {
        ecs.depth = Some("deep specialist".to_string());
    }
    let role = LEADERSHIP_RE
        .captures(msg)
        .map(|c| c[1].to_lowercase())
        .map(|r| if r == "founded" { "founder".to_string() } else { r });
    if let Some(role) = &role {
        push_unique(&mut ecs.leadership, role.clone());
    }

    let years = YEARS_RE.captures(msg).and_then(|c| c[1].parse::<u32>().ok());
    let hours = HOURS_RE.captures(msg).and_then(|c| c[1].parse::<u32>().ok());

    // Details attach to the first activity named in this answer, or the
    // first one recorded earlier.
    let named = find_terms(msg, ACTIVITIES);
    let target = named
        .first()
        .and_then(|name| ecs.activities.iter().position(|a| a.name == *name))
        .or_else(|| (!ecs.activities.is_empty()).then_some(0));
    let index = match target {
        Some(index) => index,
        None => match named.first() {
            Some(name) => {
                ecs.activities.push(Activity {
                    name: name.to_string(),
                    ..Activity::default()
                });
                ecs.activities.len() - 1
            }
            None => return,
        },
    };

    let activity = &mut ecs.activities[index];
    if years.is_some() {
        activity.years_involved = years;
    }
    if hours.is_some() {
        activity.hours_per_week = hours;
    }
    if role.is_some() {
        activity.role = role;
    }
}

pub fn collect_awards(msg: &str, data: &mut CollectedData) {
    let awards = data.awards();
    if let Some(level) = COMPETITION_LEVEL_RE.captures(msg) {
        push_unique(
            &mut awards.competitions,
            format!("{}-level competition award", level[1].to_lowercase()),
        );
    }
    for m in ACADEMIC_AWARD_RE.find_iter(msg) {
        push_unique(&mut awards.academic, m.as_str().to_lowercase());
    }
}

// ---------------------------------------------------------------------------
// Deep probe
// ---------------------------------------------------------------------------

pub fn collect_passion(msg: &str, data: &mut CollectedData) {
    let passion: String = msg.trim().chars().take(PASSION_MAX_CHARS).collect();
    if !passion.is_empty() {
        data.personality().passion = Some(passion);
    }
}

pub fn collect_service(msg: &str, data: &mut CollectedData) {
    let personality = data.personality();
    if SERVICE_RE.is_match(msg) {
        push_unique(&mut personality.values, "service-oriented");
    }
}

pub fn collect_challenges(msg: &str, data: &mut CollectedData) {
    let personality = data.personality();
    if FAMILY_FINANCE_RE.is_match(msg) {
        push_unique(&mut personality.challenges, "family/financial challenges");
    }
    if IDENTITY_CHALLENGE_RE.is_match(msg) {
        push_unique(&mut personality.challenges, "identity challenges");
    }
    for m in RED_FLAG_RE.find_iter(msg) {
        push_unique(&mut data.red_flags, m.as_str().to_lowercase());
    }
}

pub fn collect_curiosity(msg: &str, data: &mut CollectedData) {
    let personality = data.personality();
    if CURIOSITY_RE.is_match(msg) {
        push_unique(&mut personality.values, "intellectually curious");
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

pub fn collect_reflection(msg: &str, data: &mut CollectedData) {
    let narrative = data.narrative();
    if AFFIRM_RE.is_match(msg) {
        narrative.positioning = Some("student confirmed positioning".to_string());
    }
}

pub fn collect_positioning_test(_msg: &str, data: &mut CollectedData) {
    push_unique(&mut data.narrative().archetypes, "tested archetype");
}

pub fn collect_story_threads(msg: &str, data: &mut CollectedData) {
    let narrative = data.narrative();
    if LEGACY_RE.is_match(msg) {
        push_unique(&mut narrative.thematic_hubs, "family legacy");
    }
    if OVERCOMING_RE.is_match(msg) {
        push_unique(&mut narrative.thematic_hubs, "overcoming adversity");
    }
    if BUILDING_RE.is_match(msg) {
        push_unique(&mut narrative.thematic_hubs, "building something");
    }
}

pub fn collect_risks(_msg: &str, data: &mut CollectedData) {
    push_unique(&mut data.narrative().risks, "risk flagged");
}

pub fn collect_opportunities(_msg: &str, data: &mut CollectedData) {
    push_unique(&mut data.narrative().opportunities, "opportunity highlighted");
}

pub fn collect_archetype_check(msg: &str, data: &mut CollectedData) {
    let narrative = data.narrative();
    if RESONATES_RE.is_match(msg) {
        push_unique(&mut narrative.archetypes, "archetype validated by student");
    }
}

pub fn collect_differentiation(_msg: &str, data: &mut CollectedData) {
    data.narrative().positioning = Some("differentiation discussed".to_string());
}

// ---------------------------------------------------------------------------
// Wrap
// ---------------------------------------------------------------------------

pub fn collect_college_preferences(msg: &str, data: &mut CollectedData) {
    let colleges = data.colleges();
    for name in find_terms(msg, COLLEGES) {
        push_unique(&mut colleges.targets, name);
    }
    for m in DEAL_BREAKER_RE.captures_iter(msg) {
        push_unique(&mut colleges.deal_breakers, m[1].to_lowercase());
    }
    let without_deal_breakers = DEAL_BREAKER_RE.replace_all(msg, "");
    for m in SETTING_RE.find_iter(&without_deal_breakers) {
        push_unique(&mut colleges.interests, m.as_str().to_lowercase());
    }
}

pub fn collect_concerns(msg: &str, data: &mut CollectedData) {
    if CONCERN_RE.is_match(msg) {
        push_unique(&mut data.personality().fears, "final session concerns");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(collector: fn(&str, &mut CollectedData), msg: &str) -> CollectedData {
        let mut data = CollectedData::default();
        collector(msg, &mut data);
        data
    }

    #[test]
    fn test_intro_detects_fears_and_excitement() {
        let data = run(collect_intro, "Honestly I'm nervous but also pumped");
        let p = data.personality.unwrap();
        assert_eq!(p.fears, vec!["anxious about college process"]);
        assert_eq!(p.excitements, vec!["excited about college"]);
    }

    #[test]
    fn test_background_identity_needs_whole_word() {
        let data = run(collect_background, "I'm into biology and my ambition is big");
        assert!(data.personality.unwrap().identity.is_empty());

        let data = run(collect_background, "I'm bi and my parents are from Vietnam");
        let p = data.personality.unwrap();
        assert_eq!(p.identity, vec!["LGBTQ+"]);
        assert_eq!(p.background, vec!["immigrant background"]);
    }

    #[test]
    fn test_background_probe_records_family_pressure() {
        let data = run(collect_background_probe, "My parents want me to be a doctor");
        assert_eq!(
            data.personality.unwrap().background,
            vec!["family pressure on college"]
        );
    }

    #[test]
    fn test_school_context_grade_and_environment() {
        let data = run(collect_school_context, "I'm a junior at a super competitive school");
        let a = data.academics.unwrap();
        assert_eq!(a.grade_level.as_deref(), Some("junior"));
        assert_eq!(
            a.academic_challenges,
            vec!["junior year stress", "competitive school environment"]
        );
    }

    #[test]
    fn test_school_context_without_grade() {
        let data = run(collect_school_context, "It's pretty chill honestly");
        assert_eq!(data.academics.unwrap().grade_level, None);
    }

    #[test]
    fn test_gpa_unweighted_then_weighted() {
        let data = run(collect_gpa, "It's a 3.85 unweighted and 4.3 weighted");
        let gpa = data.academics.unwrap().gpa.unwrap();
        assert_eq!(gpa.unweighted, Some(3.85));
        assert_eq!(gpa.weighted, Some(4.3));
    }

    #[test]
    fn test_gpa_absent() {
        let data = run(collect_gpa, "uh, pretty good I think?");
        assert_eq!(data.academics.unwrap().gpa.unwrap().unweighted, None);
    }

    #[test]
    fn test_rigor_counts_ap_mentions() {
        let data = run(
            collect_rigor,
            "AP Biology, AP Calculus, AP Chemistry, plus AP World History and AP Lang",
        );
        let a = data.academics.unwrap();
        assert_eq!(a.rigor_level.as_deref(), Some("high"));
        assert!(a.ap_courses.contains(&"AP Biology".to_string()));
        assert!(a.ap_courses.contains(&"AP World History".to_string()));

        let data = run(collect_rigor, "I'm taking AP Physics this year. So happy.");
        assert_eq!(data.academics.unwrap().rigor_level.as_deref(), Some("moderate"));
    }

    #[test]
    fn test_favorites_split_by_clause() {
        let data = run(collect_favorites, "I love biology, but I'm terrible at chemistry.");
        let a = data.academics.unwrap();
        assert_eq!(a.favorite_subjects, vec!["Biology"]);
        assert_eq!(a.weak_subjects, vec!["Chemistry"]);
    }

    #[test]
    fn test_ecs_overview_and_depth() {
        let mut data = CollectedData::default();
        collect_ecs_overview("Debate, robotics and I tutor kids on weekends", &mut data);
        collect_ecs_depth(
            "I've been on robotics for 3 years, I'm captain now, about 10 hours a week",
            &mut data,
        );
        let ecs = data.ecs.unwrap();
        assert_eq!(ecs.depth.as_deref(), Some("deep specialist"));
        assert_eq!(ecs.leadership, vec!["captain"]);
        let robotics = ecs.activities.iter().find(|a| a.name == "Robotics").unwrap();
        assert_eq!(robotics.years_involved, Some(3));
        assert_eq!(robotics.hours_per_week, Some(10));
        assert_eq!(robotics.role.as_deref(), Some("captain"));
    }

    #[test]
    fn test_awards_levels() {
        let data = run(collect_awards, "I placed at State for debate and made honor roll");
        let awards = data.awards.unwrap();
        assert_eq!(awards.competitions, vec!["state-level competition award"]);
        assert_eq!(awards.academic, vec!["honor roll"]);
    }

    #[test]
    fn test_passion_truncates_on_char_boundary() {
        let long = "é".repeat(PASSION_MAX_CHARS + 50);
        let data = run(collect_passion, &long);
        let passion = data.personality.unwrap().passion.unwrap();
        assert_eq!(passion.chars().count(), PASSION_MAX_CHARS);
    }

    #[test]
    fn test_challenges_and_red_flags() {
        let data = run(
            collect_challenges,
            "Money was tight at home and I got suspended sophomore year",
        );
        assert_eq!(
            data.personality.unwrap().challenges,
            vec!["family/financial challenges"]
        );
        assert_eq!(data.red_flags, vec!["suspended"]);
    }

    #[test]
    fn test_college_preferences() {
        let data = run(
            collect_college_preferences,
            "Stanford or MIT, somewhere with research. I don't want anywhere cold.",
        );
        let colleges = data.colleges.unwrap();
        assert_eq!(colleges.targets, vec!["Stanford", "MIT"]);
        assert_eq!(colleges.deal_breakers, vec!["cold"]);
        assert_eq!(colleges.interests, vec!["research"]);
    }

    #[test]
    fn test_differentiation_overwrites_positioning() {
        let mut data = CollectedData::default();
        collect_reflection("yes exactly", &mut data);
        collect_differentiation("ok", &mut data);
        assert_eq!(
            data.narrative.unwrap().positioning.as_deref(),
            Some("differentiation discussed")
        );
    }
}
