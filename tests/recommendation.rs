use chrono::{TimeZone, Utc};
use donorec::{
    DonorecConfig, EngineError, GeoFix, OrganizationRecord, RecommendationEngine, StoreConfig,
    StoreError, VisitEvent,
};

fn config_in(dir: &tempfile::TempDir) -> DonorecConfig {
    DonorecConfig {
        store: StoreConfig {
            path: dir.path().join("orgvec.idx"),
        },
        ..Default::default()
    }
}

fn org(id: i64, latitude: f64, longitude: f64, description: &str) -> OrganizationRecord {
    OrganizationRecord {
        id,
        latitude,
        longitude,
        created_at: Utc.with_ymd_and_hms(2021, 6, 1, 0, 0, 0).unwrap(),
        description: Some(description.to_string()),
    }
}

#[test]
fn visited_nearby_organization_ranks_first() -> Result<(), EngineError> {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::new(&config_in(&dir))?;

    // One organization in Bengaluru, two far away in every slot.
    engine.index_organization(&org(1, 12.9, 77.6, "feeds children"))?;
    engine.index_organization(&org(2, 64.1, -21.9, "glacier preservation society"))?;
    engine.index_organization(&org(3, -33.9, 151.2, "harbor cleanup volunteers"))?;

    let pref = engine.new_preference(7);
    let event = VisitEvent {
        user_id: 7,
        organization_id: 1,
        location: Some(GeoFix {
            latitude: "12.9".into(),
            longitude: "77.6".into(),
        }),
    };
    let pref = engine.record_visit(&pref, &event, 1)?;

    let ranked = engine.recommend(&pref, 3)?;
    assert_eq!(ranked.len(), 3);
    assert_eq!(ranked[0], 1);
    Ok(())
}

#[test]
fn preference_survives_byte_roundtrip_through_relational_field() -> Result<(), EngineError> {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::new(&config_in(&dir))?;
    engine.index_organization(&org(1, 12.9, 77.6, "feeds children"))?;

    let pref = engine.new_preference(7);
    let event = VisitEvent {
        user_id: 7,
        organization_id: 1,
        location: None,
    };
    let pref = engine.record_visit(&pref, &event, 1)?;

    // What the relational layer would store and load back.
    let blob = pref.to_bytes();
    let restored = donorec::UserPreference::from_bytes(7, &blob, pref.visit_count)?;
    assert_eq!(restored, pref);

    assert_eq!(engine.recommend(&restored, 1)?, engine.recommend(&pref, 1)?);
    Ok(())
}

#[test]
fn index_survives_engine_restart() -> Result<(), EngineError> {
    let dir = tempfile::tempdir().unwrap();
    let config = config_in(&dir);

    {
        let engine = RecommendationEngine::new(&config)?;
        engine.index_organization(&org(11, 1.0, 2.0, "first"))?;
        engine.index_organization(&org(12, 3.0, 4.0, "second"))?;
    }

    let engine = RecommendationEngine::new(&config)?;
    let pref = engine.new_preference(1);
    let ranked = engine.recommend(&pref, 10)?;
    assert_eq!(ranked.len(), 2);
    assert!(ranked.contains(&11));
    assert!(ranked.contains(&12));
    Ok(())
}

#[test]
fn reindexing_replaces_the_previous_vector() -> Result<(), EngineError> {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::new(&config_in(&dir))?;

    engine.index_organization(&org(1, 0.0, 0.0, "old description"))?;
    let before = engine.store().search_vector(1)?;

    engine.index_organization(&org(1, 45.0, 90.0, "entirely new mission"))?;
    let after = engine.store().search_vector(1)?;

    assert_ne!(before, after);
    assert_eq!(engine.recommend(&engine.new_preference(1), 10)?.len(), 1);
    Ok(())
}

#[test]
fn invalid_location_still_updates_taste() -> Result<(), EngineError> {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::new(&config_in(&dir))?;
    engine.index_organization(&org(1, 12.9, 77.6, "feeds children"))?;

    let pref = engine.new_preference(7);
    let event = VisitEvent {
        user_id: 7,
        organization_id: 1,
        location: Some(GeoFix {
            latitude: "not-a-number".into(),
            longitude: "77.6".into(),
        }),
    };
    let updated = engine.record_visit(&pref, &event, 1)?;

    // Location slots untouched, taste slots moved.
    assert_eq!(updated.vector[0], 0.0);
    assert_eq!(updated.vector[1], 0.0);
    assert!(updated.vector[2..].iter().any(|&x| x != 0.0));
    Ok(())
}

#[test]
fn unknown_organization_visit_surfaces_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let engine = RecommendationEngine::new(&config_in(&dir)).unwrap();

    let pref = engine.new_preference(7);
    let event = VisitEvent {
        user_id: 7,
        organization_id: 999,
        location: None,
    };
    let err = engine.record_visit(&pref, &event, 1).unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::NotFound(999))));
}
