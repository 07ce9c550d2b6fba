use std::time::Duration;

use werewolf_server::{
    error::{GameError, ServiceError},
    models::{
        config::GameConfig,
        event_bus::Subscription,
        game::GamePhase,
        player::PlayerId,
        role::{Role, Side},
        state_change::{ChangeKind, StateChange},
        user::RegisterUserRequest,
    },
    services::game_service,
    state::AppState,
    utils::test_setup::{register_players, scripted_state},
};

/// ゲームを作成する。picks の先頭はゲームID、続きは人狼の抽選に使われる
async fn setup_game(
    picks: Vec<usize>,
    player_num: usize,
    werewolf_num: usize,
) -> (AppState, String, Vec<PlayerId>) {
    let state = scripted_state(picks);
    let players: Vec<PlayerId> = register_players(&state, player_num)
        .await
        .into_iter()
        .map(|(id, _)| id)
        .collect();

    let config = GameConfig::new(player_num, werewolf_num).unwrap();
    let game_state = game_service::create_game(&state, players[0], config)
        .await
        .unwrap();

    (state, game_state.id, players)
}

async fn join_rest(state: &AppState, game_id: &str, players: &[PlayerId]) {
    for player_id in &players[1..] {
        game_service::join_game(state, game_id, *player_id)
            .await
            .unwrap();
    }
}

async fn recv(subscription: &Subscription<StateChange>) -> Option<StateChange> {
    tokio::time::timeout(Duration::from_secs(1), subscription.recv())
        .await
        .expect("通知が届きませんでした")
}

#[tokio::test]
async fn test_create_game() {
    let (state, game_id, players) = setup_game(vec![123456], 4, 1).await;
    assert_eq!(game_id, "123456");

    let game_state = game_service::get_game_state(&state, &game_id).await.unwrap();
    assert_eq!(game_state.phase, GamePhase::Start);
    assert_eq!(game_state.players.len(), 1);
    assert_eq!(game_state.players[&players[0]].name, "Player1");
}

#[tokio::test]
async fn test_unknown_user_cannot_create() {
    let state = scripted_state(vec![]);
    let config = GameConfig::new(3, 1).unwrap();
    let result = game_service::create_game(&state, 99, config).await;
    assert!(matches!(result, Err(ServiceError::User(_))));
    assert!(state.games.is_empty().await);
}

#[tokio::test]
async fn test_actions_on_missing_game() {
    let state = scripted_state(vec![]);
    register_players(&state, 1).await;

    assert!(matches!(
        game_service::join_game(&state, "000000", 1).await,
        Err(ServiceError::GameNotFound(_))
    ));
    assert!(matches!(
        game_service::next(&state, "000000", 1).await,
        Err(ServiceError::GameNotFound(_))
    ));
    assert!(matches!(
        game_service::observe_state(&state, "000000", 1).await,
        Err(ServiceError::GameNotFound(_))
    ));
}

#[tokio::test]
async fn test_join_notifies_observers_and_starts_game() {
    // 3人目が人狼
    let (state, game_id, players) = setup_game(vec![1, 2], 3, 1).await;
    let creator = game_service::observe_state(&state, &game_id, players[0])
        .await
        .unwrap();

    game_service::join_game(&state, &game_id, players[1])
        .await
        .unwrap();
    let change = recv(&creator).await.unwrap();
    assert_eq!(
        change.kind,
        ChangeKind::PlayerJoined {
            player_id: players[1]
        }
    );
    assert_eq!(change.state.players.len(), 2);

    let second = game_service::observe_state(&state, &game_id, players[1])
        .await
        .unwrap();
    game_service::join_game(&state, &game_id, players[2])
        .await
        .unwrap();

    for subscription in [&creator, &second] {
        let joined = recv(subscription).await.unwrap();
        assert_eq!(
            joined.kind,
            ChangeKind::PlayerJoined {
                player_id: players[2]
            }
        );

        let started = recv(subscription).await.unwrap();
        assert_eq!(
            started.kind,
            ChangeKind::PhaseChanged {
                killed_player_id: None
            }
        );
        assert_eq!(started.old_phase, GamePhase::Start);
        assert_eq!(started.state.phase, GamePhase::Night);
        assert_eq!(started.state.day, 1);
    }

    let roles = game_service::get_roles(&state, &game_id, players[2])
        .await
        .unwrap();
    assert_eq!(roles.get(&players[2]), Some(&Role::Werewolf));
    assert_eq!(roles.len(), 1);
}

#[tokio::test]
async fn test_duplicate_join_is_rejected() {
    let (state, game_id, players) = setup_game(vec![], 3, 1).await;
    let result = game_service::join_game(&state, &game_id, players[0]).await;
    assert!(matches!(
        result,
        Err(ServiceError::Game(GameError::AlreadyJoined(id))) if id == players[0]
    ));

    let game_state = game_service::get_game_state(&state, &game_id).await.unwrap();
    assert_eq!(game_state.players.len(), 1);
}

#[tokio::test]
async fn test_leave_notifies_and_unsubscribes() {
    let (state, game_id, players) = setup_game(vec![], 3, 1).await;
    game_service::join_game(&state, &game_id, players[1])
        .await
        .unwrap();

    let creator = game_service::observe_state(&state, &game_id, players[0])
        .await
        .unwrap();
    let leaver = game_service::observe_state(&state, &game_id, players[1])
        .await
        .unwrap();

    let game_state = game_service::leave_game(&state, &game_id, players[1])
        .await
        .unwrap();
    assert!(game_state.player(players[1]).is_none());

    for subscription in [&creator, &leaver] {
        let change = recv(subscription).await.unwrap();
        assert_eq!(
            change.kind,
            ChangeKind::PlayerLeft {
                player_id: players[1]
            }
        );
    }
    assert!(recv(&leaver).await.is_none());

    // 抜けたプレイヤーはもう購読できない
    assert!(matches!(
        game_service::observe_state(&state, &game_id, players[1]).await,
        Err(ServiceError::Game(GameError::PlayerNotFound(_)))
    ));
}

#[tokio::test]
async fn test_villagers_win_and_game_is_removed() {
    // 3人目が人狼
    let (state, game_id, players) = setup_game(vec![1, 2], 3, 1).await;
    join_rest(&state, &game_id, &players).await;
    let observer = game_service::observe_state(&state, &game_id, players[0])
        .await
        .unwrap();

    for player_id in &players {
        game_service::next(&state, &game_id, *player_id)
            .await
            .unwrap();
    }
    let dawn = recv(&observer).await.unwrap();
    assert_eq!(dawn.kind, ChangeKind::PhaseChangedWithoutKilling);
    assert_eq!(dawn.old_phase, GamePhase::Night);
    assert_eq!(dawn.state.phase, GamePhase::Noon);

    game_service::vote(&state, &game_id, players[0], Some(players[2]))
        .await
        .unwrap();
    game_service::vote(&state, &game_id, players[1], Some(players[2]))
        .await
        .unwrap();
    game_service::vote(&state, &game_id, players[2], Some(players[0]))
        .await
        .unwrap();

    let over = recv(&observer).await.unwrap();
    assert_eq!(
        over.kind,
        ChangeKind::GameOver {
            winner: Side::Villagers
        }
    );
    assert_eq!(over.state.phase, GamePhase::End);
    assert!(over.state.players[&players[2]].is_dead);

    // 終了したゲームは購読が閉じられ、登録から消える
    assert!(recv(&observer).await.is_none());
    assert!(matches!(
        game_service::get_game_state(&state, &game_id).await,
        Err(ServiceError::GameNotFound(_))
    ));
}

#[tokio::test]
async fn test_night_kill_is_reported() {
    // 1人目が人狼
    let (state, game_id, players) = setup_game(vec![7, 0], 4, 1).await;
    join_rest(&state, &game_id, &players).await;
    let observer = game_service::observe_state(&state, &game_id, players[1])
        .await
        .unwrap();

    for player_id in &players {
        game_service::next(&state, &game_id, *player_id)
            .await
            .unwrap();
    }
    for player_id in &players {
        game_service::vote(&state, &game_id, *player_id, None)
            .await
            .unwrap();
    }
    assert_eq!(
        recv(&observer).await.unwrap().kind,
        ChangeKind::PhaseChangedWithoutKilling
    );
    let night = recv(&observer).await.unwrap();
    assert_eq!(night.kind, ChangeKind::PhaseChangedWithoutKilling);
    assert_eq!(night.state.phase, GamePhase::Night);
    assert_eq!(night.state.day, 2);

    let result = game_service::kill(&state, &game_id, players[1], players[2]).await;
    assert!(matches!(
        result,
        Err(ServiceError::Game(GameError::NotWerewolf(_)))
    ));

    game_service::kill(&state, &game_id, players[0], players[3])
        .await
        .unwrap();
    for player_id in &players[1..] {
        game_service::next(&state, &game_id, *player_id)
            .await
            .unwrap();
    }

    let morning = recv(&observer).await.unwrap();
    assert_eq!(
        morning.kind,
        ChangeKind::PhaseChanged {
            killed_player_id: Some(players[3])
        }
    );
    assert_eq!(morning.state.phase, GamePhase::Noon);
    assert!(morning.state.players[&players[3]].is_dead);

    let victim = game_service::get_player(&state, &game_id, players[3])
        .await
        .unwrap();
    assert!(victim.is_dead);
}

#[tokio::test]
async fn test_concurrent_votes_resolve_once() {
    let (state, game_id, players) = setup_game(vec![5, 0, 0], 5, 2).await;
    join_rest(&state, &game_id, &players).await;
    let observer = game_service::observe_state(&state, &game_id, players[4])
        .await
        .unwrap();

    for player_id in &players {
        game_service::next(&state, &game_id, *player_id)
            .await
            .unwrap();
    }
    assert_eq!(
        recv(&observer).await.unwrap().state.phase,
        GamePhase::Noon
    );

    let handles: Vec<_> = players
        .iter()
        .map(|player_id| {
            let state = state.clone();
            let game_id = game_id.clone();
            let player_id = *player_id;
            tokio::spawn(async move { game_service::vote(&state, &game_id, player_id, None).await })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let change = recv(&observer).await.unwrap();
    assert_eq!(change.kind, ChangeKind::PhaseChangedWithoutKilling);
    assert_eq!(change.state.day, 2);
    assert_eq!(change.state.alive_count(), 5);

    // 遷移は1回だけ
    let extra = tokio::time::timeout(Duration::from_millis(100), observer.recv()).await;
    assert!(extra.is_err());
}

#[tokio::test]
async fn test_unregistered_player_cannot_join() {
    let (state, game_id, _) = setup_game(vec![], 3, 1).await;
    let late = state
        .user_service
        .register(RegisterUserRequest {
            player_name: "Late".to_string(),
        })
        .await
        .unwrap();

    game_service::join_game(&state, &game_id, late.player_id)
        .await
        .unwrap();
    assert!(matches!(
        game_service::join_game(&state, &game_id, 1000).await,
        Err(ServiceError::User(_))
    ));
}
