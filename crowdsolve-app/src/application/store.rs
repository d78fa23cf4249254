use super::collection::{Collection, Entity};
use crate::domain::{Comment, Problem, ProblemId, Solution, SolutionId, UpvoteTally, UserId};
use dashmap::DashMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;

const EVENT_CAPACITY: usize = 256;
const JOURNAL_LIMIT: usize = 64;

/// Notification sent to every subscriber after the store changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreEvent {
    ProblemsChanged,
    ProblemRemoved(ProblemId),
    SolutionsChanged(ProblemId),
    CommentsChanged(SolutionId),
    TallyChanged(SolutionId),
}

/// Taken when a fetch starts; the result is only applied if the ticket is still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket<K> {
    key: K,
    /// Identifies the slot the fetch started against; a slot dropped and
    /// recreated in between never accepts the result.
    epoch: u64,
    generation: u64,
}

impl<K> FetchTicket<K> {
    pub fn key(&self) -> &K {
        &self.key
    }
}

/// Latest authoritative vote answer for a solution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedTally {
    pub voter: UserId,
    pub tally: UpvoteTally,
    generation: u64,
}

enum Op<T: Entity> {
    Prepend(T),
    Replace(T),
    Remove(T::Id),
}

impl<T: Entity> Op<T> {
    fn apply(&self, items: &mut Collection<T>) -> bool {
        match self {
            Self::Prepend(item) => {
                items.prepend(item.clone());
                true
            }
            Self::Replace(item) => items.replace_by_id(item.clone()),
            Self::Remove(id) => items.remove_by_id(id).is_some(),
        }
    }
}

/// One cached collection plus the bookkeeping that lets a late fetch merge with
/// local edits made while it was in flight.
struct Slot<T: Entity> {
    epoch: u64,
    items: Collection<T>,
    loaded: bool,
    generation: u64,
    /// Tickets older than this can no longer be reconciled.
    floor: u64,
    journal: VecDeque<(u64, Op<T>)>,
}

impl<T: Entity> Slot<T> {
    fn new(epoch: u64) -> Self {
        Self {
            epoch,
            items: Collection::new(),
            loaded: false,
            generation: 0,
            floor: 0,
            journal: VecDeque::new(),
        }
    }

    fn ticket<K>(&self, key: K) -> FetchTicket<K> {
        FetchTicket {
            key,
            epoch: self.epoch,
            generation: self.generation,
        }
    }

    fn mutate(&mut self, op: Op<T>) -> bool {
        let changed = op.apply(&mut self.items);
        self.generation += 1;
        self.journal.push_back((self.generation, op));
        if self.journal.len() > JOURNAL_LIMIT {
            if let Some((generation, _)) = self.journal.pop_front() {
                self.floor = generation;
            }
        }
        changed
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.floor = self.generation;
        self.journal.clear();
        self.loaded = false;
    }

    /// Replaces the contents with `fetched`, replaying local edits newer than the ticket.
    fn fill<K>(&mut self, ticket: &FetchTicket<K>, fetched: Vec<T>) -> bool {
        let ticket_generation = ticket.generation;
        if ticket.epoch != self.epoch || ticket_generation < self.floor {
            return false;
        }

        let mut items = Collection::from_items(fetched);
        for (generation, op) in &self.journal {
            if *generation > ticket_generation {
                op.apply(&mut items);
            }
        }

        self.items = items;
        self.loaded = true;
        self.floor = ticket_generation;
        self.journal.retain(|(generation, _)| *generation > ticket_generation);
        true
    }
}

struct StoreInner {
    problems: Mutex<Slot<Problem>>,
    solutions: DashMap<ProblemId, Slot<Solution>>,
    comments: DashMap<SolutionId, Slot<Comment>>,
    tallies: DashMap<SolutionId, RecordedTally>,
    solution_parent: DashMap<SolutionId, ProblemId>,
    epochs: AtomicU64,
    events: broadcast::Sender<StoreEvent>,
}

/// Single id-keyed source of truth shared by every view.
#[derive(Clone)]
pub struct EntityStore {
    inner: Arc<StoreInner>,
}

impl EntityStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                problems: Mutex::new(Slot::new(0)),
                solutions: DashMap::new(),
                comments: DashMap::new(),
                tallies: DashMap::new(),
                solution_parent: DashMap::new(),
                epochs: AtomicU64::new(1),
                events,
            }),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    fn emit(&self, event: StoreEvent) {
        // No subscribers is fine.
        let _ = self.inner.events.send(event);
    }

    fn fresh_slot<T: Entity>(&self) -> Slot<T> {
        Slot::new(self.inner.epochs.fetch_add(1, Ordering::Relaxed))
    }

    fn problems_slot(&self) -> MutexGuard<'_, Slot<Problem>> {
        self.inner
            .problems
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    // Problems

    pub fn begin_problems_fetch(&self) -> FetchTicket<()> {
        self.problems_slot().ticket(())
    }

    pub fn fill_problems(&self, ticket: FetchTicket<()>, problems: Vec<Problem>) -> bool {
        let applied = self.problems_slot().fill(&ticket, problems);
        if applied {
            self.emit(StoreEvent::ProblemsChanged);
        } else {
            tracing::debug!("Discarded stale problems fetch");
        }
        applied
    }

    pub fn problems(&self) -> Vec<Problem> {
        self.problems_slot().items.to_vec()
    }

    pub fn problems_loaded(&self) -> bool {
        self.problems_slot().loaded
    }

    pub fn problem(&self, id: &ProblemId) -> Option<Problem> {
        self.problems_slot().items.get(id).cloned()
    }

    pub fn prepend_problem(&self, problem: Problem) {
        self.problems_slot().mutate(Op::Prepend(problem));
        self.emit(StoreEvent::ProblemsChanged);
    }

    /// Supersedes the stored version with the same id; absent ids are left alone.
    pub fn replace_problem(&self, problem: Problem) -> bool {
        let replaced = self.problems_slot().mutate(Op::Replace(problem));
        if replaced {
            self.emit(StoreEvent::ProblemsChanged);
        }
        replaced
    }

    /// Removes the problem and drops everything cached beneath it. Fetches still
    /// in flight for the dropped slots are discarded when they land.
    pub fn remove_problem(&self, id: &ProblemId) -> bool {
        let removed = self.problems_slot().mutate(Op::Remove(id.clone()));

        let mut orphaned: Vec<SolutionId> = self
            .inner
            .solutions
            .remove(id)
            .map(|(_, slot)| slot.items.iter().map(|s| s.id.clone()).collect())
            .unwrap_or_default();
        self.inner.solution_parent.retain(|solution_id, parent| {
            if *parent != *id {
                return true;
            }
            if !orphaned.contains(solution_id) {
                orphaned.push(solution_id.clone());
            }
            false
        });
        self.forget_solutions(&orphaned);

        if removed {
            self.emit(StoreEvent::ProblemRemoved(id.clone()));
            self.emit(StoreEvent::ProblemsChanged);
        }
        removed
    }

    fn forget_solutions(&self, solution_ids: &[SolutionId]) {
        for solution_id in solution_ids {
            self.inner.comments.remove(solution_id);
            self.inner.tallies.remove(solution_id);
            self.inner.solution_parent.remove(solution_id);
        }
    }

    pub fn invalidate_problems(&self) {
        self.problems_slot().invalidate();
        self.emit(StoreEvent::ProblemsChanged);
    }

    // Solutions

    pub fn begin_solutions_fetch(&self, problem_id: &ProblemId) -> FetchTicket<ProblemId> {
        self.inner
            .solutions
            .entry(problem_id.clone())
            .or_insert_with(|| self.fresh_slot())
            .ticket(problem_id.clone())
    }

    /// Applies a solutions fetch. Solutions the service no longer returns lose
    /// their parent link, comments and tally.
    pub fn fill_solutions(&self, ticket: FetchTicket<ProblemId>, solutions: Vec<Solution>) -> bool {
        let fetched_ids: Vec<SolutionId> = solutions.iter().map(|s| s.id.clone()).collect();
        let current: Option<Vec<SolutionId>> =
            self.inner.solutions.get_mut(&ticket.key).and_then(|mut slot| {
                slot.fill(&ticket, solutions)
                    .then(|| slot.items.iter().map(|s| s.id.clone()).collect())
            });

        let Some(current) = current else {
            tracing::debug!("Discarded stale solutions fetch for problem {}", ticket.key);
            return false;
        };

        let mut vanished = Vec::new();
        self.inner.solution_parent.retain(|solution_id, parent| {
            let keep = *parent != ticket.key || current.contains(solution_id);
            if !keep {
                vanished.push(solution_id.clone());
            }
            keep
        });
        self.forget_solutions(&vanished);

        for solution_id in fetched_ids {
            self.inner
                .solution_parent
                .insert(solution_id.clone(), ticket.key.clone());
            // The fetched upvote set is newer than any tally recorded before the fetch began.
            self.inner
                .tallies
                .remove_if(&solution_id, |_, recorded| recorded.generation <= ticket.generation);
        }
        self.emit(StoreEvent::SolutionsChanged(ticket.key));
        true
    }

    pub fn solutions(&self, problem_id: &ProblemId) -> Vec<Solution> {
        self.inner
            .solutions
            .get(problem_id)
            .map(|slot| slot.items.to_vec())
            .unwrap_or_default()
    }

    pub fn solutions_loaded(&self, problem_id: &ProblemId) -> bool {
        self.inner
            .solutions
            .get(problem_id)
            .is_some_and(|slot| slot.loaded)
    }

    pub fn solution_count(&self, problem_id: &ProblemId) -> usize {
        self.inner
            .solutions
            .get(problem_id)
            .map(|slot| slot.items.len())
            .unwrap_or(0)
    }

    pub fn solution(&self, solution_id: &SolutionId) -> Option<Solution> {
        let problem_id = self.inner.solution_parent.get(solution_id)?.value().clone();
        let slot = self.inner.solutions.get(&problem_id)?;
        slot.items.get(solution_id).cloned()
    }

    pub fn prepend_solution(&self, problem_id: &ProblemId, solution: Solution) {
        self.inner
            .solution_parent
            .insert(solution.id.clone(), problem_id.clone());
        self.inner
            .solutions
            .entry(problem_id.clone())
            .or_insert_with(|| self.fresh_slot())
            .mutate(Op::Prepend(solution));
        self.emit(StoreEvent::SolutionsChanged(problem_id.clone()));
    }

    pub fn invalidate_solutions(&self, problem_id: &ProblemId) {
        if let Some(mut slot) = self.inner.solutions.get_mut(problem_id) {
            slot.invalidate();
        }
        self.emit(StoreEvent::SolutionsChanged(problem_id.clone()));
    }

    // Comments

    pub fn begin_comments_fetch(&self, solution_id: &SolutionId) -> FetchTicket<SolutionId> {
        self.inner
            .comments
            .entry(solution_id.clone())
            .or_insert_with(|| self.fresh_slot())
            .ticket(solution_id.clone())
    }

    pub fn fill_comments(&self, ticket: FetchTicket<SolutionId>, comments: Vec<Comment>) -> bool {
        let applied = self
            .inner
            .comments
            .get_mut(&ticket.key)
            .is_some_and(|mut slot| slot.fill(&ticket, comments));

        if applied {
            self.emit(StoreEvent::CommentsChanged(ticket.key));
        } else {
            tracing::debug!("Discarded stale comments fetch for solution {}", ticket.key);
        }
        applied
    }

    pub fn comments(&self, solution_id: &SolutionId) -> Vec<Comment> {
        self.inner
            .comments
            .get(solution_id)
            .map(|slot| slot.items.to_vec())
            .unwrap_or_default()
    }

    pub fn comments_loaded(&self, solution_id: &SolutionId) -> bool {
        self.inner
            .comments
            .get(solution_id)
            .is_some_and(|slot| slot.loaded)
    }

    pub fn prepend_comment(&self, solution_id: &SolutionId, comment: Comment) {
        self.inner
            .comments
            .entry(solution_id.clone())
            .or_insert_with(|| self.fresh_slot())
            .mutate(Op::Prepend(comment));
        self.emit(StoreEvent::CommentsChanged(solution_id.clone()));
    }

    pub fn invalidate_comments(&self, solution_id: &SolutionId) {
        if let Some(mut slot) = self.inner.comments.get_mut(solution_id) {
            slot.invalidate();
        }
        self.emit(StoreEvent::CommentsChanged(solution_id.clone()));
    }

    // Votes

    /// Stores the service's answer and mirrors the voter's membership into the cached solution.
    pub fn record_tally(&self, solution_id: &SolutionId, voter: &UserId, tally: UpvoteTally) {
        let parent = self
            .inner
            .solution_parent
            .get(solution_id)
            .map(|p| p.value().clone());

        let generation = match parent
            .as_ref()
            .and_then(|problem_id| self.inner.solutions.get_mut(problem_id))
        {
            Some(mut slot) => {
                let updated = slot.items.get(solution_id).cloned().map(|mut solution| {
                    if tally.has_upvoted {
                        solution.upvotes.insert(voter.clone());
                    } else {
                        solution.upvotes.remove(voter);
                    }
                    solution
                });
                if let Some(solution) = updated {
                    slot.mutate(Op::Replace(solution));
                }
                slot.generation
            }
            None => 0,
        };

        self.inner.tallies.insert(
            solution_id.clone(),
            RecordedTally {
                voter: voter.clone(),
                tally,
                generation,
            },
        );

        if let Some(problem_id) = parent {
            self.emit(StoreEvent::SolutionsChanged(problem_id));
        }
        self.emit(StoreEvent::TallyChanged(solution_id.clone()));
    }

    pub fn tally(&self, solution_id: &SolutionId) -> Option<RecordedTally> {
        self.inner.tallies.get(solution_id).map(|t| t.value().clone())
    }
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}
