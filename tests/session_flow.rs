use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use water_village::{
    components::{BuildingId, Position},
    placement::DragState,
    rules::WellIncome,
    BuildChoice, Command, Declined, RuleSet, Session, UpgradeCategory,
};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
}

fn started(rules: RuleSet) -> Session {
    let mut session = Session::new(rules, 11);
    let outcome = session.apply(Command::StartGame, t0());
    assert!(outcome.declined.is_none());
    session
}

fn text(session: &mut Session, command: Command, now: DateTime<Utc>) -> String {
    session
        .apply(command, now)
        .feedback
        .map(|line| line.text)
        .unwrap_or_default()
}

#[test]
fn commands_before_start_are_declined() {
    let mut session = Session::new(RuleSet::classic(), 1);
    let outcome = session.apply(Command::HarvestVillager, t0());
    assert_eq!(outcome.declined, Some(Declined::NotStarted));
    assert_eq!(session.village().drops(), 1000);

    assert!(!session.advance(t0() + TimeDelta::seconds(60)).changed);
    assert_eq!(session.village().drops(), 1000);
}

#[test]
fn villager_click_shows_gain() {
    let mut session = started(RuleSet::classic());
    assert_eq!(
        text(&mut session, Command::HarvestVillager, t0()),
        "+10 Water Drops!"
    );
    assert_eq!(session.village().drops(), 1010);
}

#[test]
fn feedback_expires_after_display_window() {
    let mut session = started(RuleSet::frontier());
    session.apply(Command::HarvestVillager, t0());
    assert!(session.snapshot(t0() + TimeDelta::milliseconds(1400)).feedback.is_some());

    session.advance(t0() + TimeDelta::milliseconds(1600));
    assert!(session.snapshot(t0() + TimeDelta::milliseconds(1600)).feedback.is_none());
}

#[test]
fn well_cooldown_message_names_the_wait() {
    let mut session = started(RuleSet::frontier());
    let well = Position::new(300, 150);
    assert_eq!(
        text(&mut session, Command::HarvestWell { position: well }, t0()),
        "+5 Water Drops!"
    );
    assert_eq!(
        text(
            &mut session,
            Command::HarvestWell { position: well },
            t0() + TimeDelta::seconds(30)
        ),
        "Well is refilling, try again in 90s"
    );
    let snapshot = session.snapshot(t0() + TimeDelta::seconds(30));
    assert_eq!(snapshot.buildings[1].cooldown_secs, Some(90));
}

#[test]
fn drag_outside_area_rearms_the_gesture() {
    let mut session = started(RuleSet::frontier());
    assert_eq!(
        text(
            &mut session,
            Command::BeginPlacement {
                choice: BuildChoice::House
            },
            t0()
        ),
        "Drag to place your house"
    );
    session.apply(
        Command::DragTo {
            position: Position::new(700, 50),
        },
        t0(),
    );
    let outcome = session.apply(Command::Release, t0());
    assert!(matches!(outcome.declined, Some(Declined::OutOfBounds { .. })));
    assert_eq!(
        outcome.feedback.map(|line| line.text).as_deref(),
        Some("Can't build there, try again!")
    );
    assert_eq!(
        session.snapshot(t0()).placement,
        DragState::Dragging {
            choice: BuildChoice::House,
            cursor: None
        }
    );
    assert_eq!(session.village().drops(), 1000);

    session.apply(
        Command::DragTo {
            position: Position::new(420, 60),
        },
        t0(),
    );
    assert_eq!(text(&mut session, Command::Release, t0()), "Built house!");
    assert_eq!(session.village().drops(), 970);
    assert_eq!(session.snapshot(t0()).placement, DragState::Idle);

    assert_eq!(
        session.apply(Command::Release, t0()).declined,
        Some(Declined::NotDragging)
    );
}

#[test]
fn release_before_dragging_asks_for_a_target() {
    let mut session = started(RuleSet::frontier());
    session.apply(
        Command::BeginPlacement {
            choice: BuildChoice::House,
        },
        t0(),
    );
    let outcome = session.apply(Command::Release, t0());
    assert_eq!(outcome.declined, Some(Declined::NoDropTarget));
    assert_eq!(
        outcome.feedback.map(|line| line.text).as_deref(),
        Some("Drag the building to where it should go first")
    );
    assert_eq!(
        session.snapshot(t0()).placement,
        DragState::Dragging {
            choice: BuildChoice::House,
            cursor: None
        }
    );
}

#[test]
fn random_build_lands_inside_the_random_area() {
    let mut session = started(RuleSet::classic());
    for _ in 0..5 {
        session.apply(
            Command::Build {
                choice: BuildChoice::Tree,
                at: None,
            },
            t0(),
        );
    }
    let area = session.village().rules().random_area;
    assert_eq!(session.village().buildings().len(), 7);
    assert!(session.village().buildings()[2..]
        .iter()
        .all(|b| area.contains(b.position)));
    assert_eq!(session.village().drops(), 950);
}

#[test]
fn same_seed_places_buildings_identically() {
    let positions = |seed| {
        let mut session = Session::new(RuleSet::classic(), seed);
        session.apply(Command::StartGame, t0());
        for _ in 0..3 {
            session.apply(
                Command::Build {
                    choice: BuildChoice::House,
                    at: None,
                },
                t0(),
            );
        }
        session
            .village()
            .buildings()
            .iter()
            .map(|b| b.position)
            .collect::<Vec<_>>()
    };
    assert_eq!(positions(42), positions(42));
}

#[test]
fn unaffordable_upgrade_has_its_own_message() {
    let mut rules = RuleSet::classic();
    rules.starting_drops = 5;
    let mut session = started(rules);
    session.apply(
        Command::Select {
            building: BuildingId::new(0),
        },
        t0(),
    );
    let outcome = session.apply(Command::UpgradeSelected, t0());
    assert!(matches!(
        outcome.declined,
        Some(Declined::InsufficientFunds { .. })
    ));
    assert_eq!(
        outcome.feedback.map(|line| line.text).as_deref(),
        Some("Not enough water drops to upgrade!")
    );
    assert_eq!(session.village().selected(), Some(BuildingId::new(0)));
}

#[test]
fn ambiguous_upgrade_asks_for_a_choice() {
    let mut session = started(RuleSet::frontier());
    session.apply(
        Command::Build {
            choice: BuildChoice::House,
            at: Some(Position::new(10, 10)),
        },
        t0(),
    );
    let outcome = session.apply(
        Command::Upgrade {
            category: UpgradeCategory::House,
        },
        t0(),
    );
    assert_eq!(
        outcome.choice,
        Some(vec![BuildingId::new(0), BuildingId::new(2)])
    );
    assert_eq!(
        outcome.feedback.map(|line| line.text).as_deref(),
        Some("Which hut? Pick 1-2")
    );
    assert_eq!(
        text(&mut session, Command::ChooseBuilding { index: 0 }, t0()),
        "Building upgraded!"
    );
    assert!(session.village().buildings()[0].upgraded);
    assert!(!session.village().buildings()[2].upgraded);
}

#[test]
fn passive_income_arrives_through_advance() {
    let mut session = started(RuleSet::classic());
    assert!(!session.advance(t0()).changed, "first tick starts the timer");
    let outcome = session.advance(t0() + TimeDelta::seconds(10));
    assert!(outcome.changed);
    assert_eq!(
        outcome.feedback.map(|line| line.text).as_deref(),
        Some("+5 Water Drops!")
    );
    assert_eq!(session.village().drops(), 1005);
}

#[test]
fn reset_stops_income_from_the_previous_game() {
    let mut session = started(RuleSet::classic());
    session.advance(t0());
    session.advance(t0() + TimeDelta::seconds(10));
    assert_eq!(session.village().drops(), 1005);

    let at = t0() + TimeDelta::seconds(11);
    assert_eq!(text(&mut session, Command::Reset, at), "Village reset!");
    assert_eq!(session.village().drops(), 1000);

    session.advance(at);
    session.advance(at + TimeDelta::seconds(10));
    assert_eq!(session.village().drops(), 1005, "one well, one payout");
}

fn upgrade_all_classic(session: &mut Session, now: DateTime<Utc>) {
    for id in [0, 1] {
        session.apply(
            Command::Select {
                building: BuildingId::new(id),
            },
            now,
        );
        session.apply(Command::UpgradeSelected, now);
    }
}

#[test]
fn classic_win_dialog_reopens_on_every_trigger() {
    let mut session = started(RuleSet::classic());
    upgrade_all_classic(&mut session, t0());
    assert_eq!(session.village().drops(), 960);
    for _ in 0..3 {
        assert!(!session.apply(Command::HarvestVillager, t0()).win_dialog_opened);
    }
    assert!(session.apply(Command::HarvestVillager, t0()).win_dialog_opened);
    assert!(session.win_dialog_open());

    assert!(!session.apply(Command::HarvestVillager, t0()).win_dialog_opened);
    assert!(session.apply(Command::DismissWin, t0()).changed);
    assert!(!session.win_dialog_open());
    assert!(session.apply(Command::HarvestVillager, t0()).win_dialog_opened);
}

#[test]
fn frontier_win_dialog_opens_once_per_game() {
    let mut rules = RuleSet::frontier();
    rules.starting_drops = 1140;
    let mut session = started(rules);
    session.apply(
        Command::Upgrade {
            category: UpgradeCategory::House,
        },
        t0(),
    );
    let outcome = session.apply(
        Command::Upgrade {
            category: UpgradeCategory::Pump,
        },
        t0(),
    );
    assert!(outcome.win_dialog_opened);
    assert_eq!(session.village().drops(), 1000);

    session.apply(Command::DismissWin, t0());
    assert!(!session.apply(Command::HarvestVillager, t0()).win_dialog_opened);
    assert!(!session.win_dialog_open());

    session.apply(Command::Reset, t0());
    session.apply(
        Command::Upgrade {
            category: UpgradeCategory::House,
        },
        t0(),
    );
    assert!(
        session
            .apply(
                Command::Upgrade {
                    category: UpgradeCategory::Pump,
                },
                t0(),
            )
            .win_dialog_opened,
        "a reset starts a new game"
    );
}

#[test]
fn snapshot_serializes_for_the_front_end() {
    let mut session = started(RuleSet::frontier());
    session.apply(
        Command::Select {
            building: BuildingId::new(1),
        },
        t0(),
    );
    let json = serde_json::to_value(session.snapshot(t0())).unwrap();
    assert_eq!(json["rules"], "frontier");
    assert_eq!(json["drops"], 1000);
    assert_eq!(json["buildings"][1]["kind"], "well");
    assert_eq!(json["buildings"][1]["selected"], true);
    assert_eq!(json["placement"]["state"], "idle");
    assert_eq!(json["feedback"]["text"], "Selected well");
}

#[test]
fn degenerate_rules_do_not_panic() {
    let mut rules = RuleSet::classic();
    rules.random_area.max = rules.random_area.min;
    rules.wells = WellIncome::Passive { interval_secs: 0 };
    assert!(rules.validate().is_err());

    let mut session = started(rules);
    let outcome = session.apply(
        Command::Build {
            choice: BuildChoice::House,
            at: None,
        },
        t0(),
    );
    assert!(outcome.declined.is_none());
    assert_eq!(session.village().buildings()[2].position, Position::new(0, 0));

    session.advance(t0());
    session.advance(t0() + TimeDelta::seconds(30));
    assert_eq!(session.village().drops(), 970);
}
