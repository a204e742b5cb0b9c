use crate::{
    problem::{routing_problem::RoutingProblem, stop::StopIdx},
    solution::{
        solution::Solution,
        tour::{Tour, TourId},
    },
};

/// One tour of a candidate, as raw stop order. Per-gene fitness lets
/// mutation target the weakest tours first if it wants to.
#[derive(Clone, Debug)]
pub struct Gene {
    pub stops: Vec<StopIdx>,
    pub fitness: f64,
}

/// One candidate solution in the population.
#[derive(Clone, Debug)]
pub struct Chromosome {
    pub genes: Vec<Gene>,
    pub fitness: f64,
    /// Generations this exact individual has survived through elitism.
    pub age: u32,
    /// Count of constraint breaches across all genes.
    pub violations: u32,
}

impl Chromosome {
    pub fn from_solution(solution: &Solution) -> Self {
        let genes = solution
            .tours()
            .iter()
            .filter(|tour| !tour.is_empty())
            .map(|tour| Gene {
                stops: tour.stops().to_vec(),
                fitness: 0.0,
            })
            .collect();

        Chromosome {
            genes,
            fitness: 0.0,
            age: 0,
            violations: 0,
        }
    }

    pub fn from_tours(tours: Vec<Vec<StopIdx>>) -> Self {
        Chromosome {
            genes: tours
                .into_iter()
                .filter(|stops| !stops.is_empty())
                .map(|stops| Gene {
                    stops,
                    fitness: 0.0,
                })
                .collect(),
            fitness: 0.0,
            age: 0,
            violations: 0,
        }
    }

    pub fn to_solution(&self, problem: &RoutingProblem) -> Solution {
        let tours = self
            .genes
            .iter()
            .enumerate()
            .map(|(index, gene)| Tour::new(TourId::new(index), gene.stops.clone(), problem))
            .collect();

        Solution::new(tours, Vec::new())
    }

    /// All stops in gene order, tour boundaries dropped.
    pub fn giant_tour(&self) -> Vec<StopIdx> {
        self.genes
            .iter()
            .flat_map(|gene| gene.stops.iter().copied())
            .collect()
    }

    pub fn num_stops(&self) -> usize {
        self.genes.iter().map(|gene| gene.stops.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{solver::greedy::GreedyConstructor, test_utils};

    #[test]
    fn test_round_trip_preserves_stops() {
        let problem = test_utils::ring_problem(10, 20);
        let solution = GreedyConstructor::construct(&problem);

        let chromosome = Chromosome::from_solution(&solution);
        assert_eq!(chromosome.num_stops(), 10);

        let back = chromosome.to_solution(&problem);
        assert!(back.is_partition(&problem));
        assert_eq!(back.total_load(), solution.total_load());
    }

    #[test]
    fn test_giant_tour_flattens_in_order() {
        let chromosome = Chromosome::from_tours(vec![
            vec![StopIdx::new(2), StopIdx::new(0)],
            vec![StopIdx::new(1)],
        ]);

        assert_eq!(
            chromosome.giant_tour(),
            vec![StopIdx::new(2), StopIdx::new(0), StopIdx::new(1)]
        );
    }
}
